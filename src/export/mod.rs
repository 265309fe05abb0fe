/// Export layer: render a filtered view as downloadable bytes.
pub mod csv;
pub mod pdf;
