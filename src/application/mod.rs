pub mod controller;
pub mod countdown;
pub mod use_cases;
pub mod view;
