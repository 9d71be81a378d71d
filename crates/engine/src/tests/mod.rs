mod helpers;

mod command_tests;
