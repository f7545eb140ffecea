mod build_all_tests;
mod common;
mod manifest_tests;
mod resolution_tests;
