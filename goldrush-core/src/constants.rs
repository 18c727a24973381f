/// Number of decimals used to print the simulated time.
pub const TIME_ROUND_DECIMALS: usize = 4;

/// Markers farther than this distance (in metres) are never selected by the token locators.
pub const SEARCH_RADIUS: f32 = 100.;

/// Absolute bound of the power accepted by a motor channel.
pub const MAX_MOTOR_POWER: f32 = 100.;
