pub mod hr_stub;
