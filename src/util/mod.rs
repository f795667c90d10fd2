pub mod logging;
pub mod shipper;
