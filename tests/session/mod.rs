//! Export reader, record file and batch session tests

mod batch_tests;
mod export_tests;
