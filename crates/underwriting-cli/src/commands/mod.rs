pub mod exit;
pub mod financing;
pub mod income;
pub mod leasing;
pub mod model;
