pub mod json_stats_repository;
