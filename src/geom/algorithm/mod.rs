mod visvalingam;

pub use visvalingam::significant_vertices;
