/// Safety logic applied on top of the factor ratings.
///
/// Submodules:
/// - `danger_flags`: cross-factor override rules that cap the overall rating.
/// - `staleness`: decides whether a buoy observation is still trustworthy.
pub mod danger_flags;
pub mod staleness;
