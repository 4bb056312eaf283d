pub mod calendar;
pub mod jsonpath;
