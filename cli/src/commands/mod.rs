pub mod address;
pub mod derive;
pub mod dleq;
pub mod export_view_key;
pub mod info;
pub mod keygen;
pub mod merkle;
pub mod scan;
