pub mod ids;
pub mod jobmodel;
pub mod usermodel;
