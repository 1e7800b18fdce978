mod check_tests;
mod common;
