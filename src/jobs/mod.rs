pub mod geocode_backfill;
pub mod orphan_repair;
