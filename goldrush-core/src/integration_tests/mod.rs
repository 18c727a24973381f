mod full_collection;
mod harness_runs;
mod repeatability;
