pub mod capture_sweep;
