pub mod listings_seed;
