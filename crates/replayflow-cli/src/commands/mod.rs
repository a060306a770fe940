pub mod generate;
pub mod probe;
pub mod quick;
pub mod run;
