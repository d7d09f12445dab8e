pub mod conversiondb;
pub mod db;
pub mod referraldb;
pub mod registrantdb;
