mod block_tests;
mod table_tests;
