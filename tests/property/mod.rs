//! Property tests for configuration merging
