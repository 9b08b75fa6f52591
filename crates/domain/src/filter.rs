use crate::group::{
    DEFAULT_GROUP_GENDER, DEFAULT_MAX_AGE, DEFAULT_MAX_DISTANCE_KM, DEFAULT_MAX_HEIGHT,
    DEFAULT_MIN_AGE, DEFAULT_MIN_HEIGHT, Group, UNRESTRICTED_GENDER,
};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bidirectional compatibility verdict for a pair of groups. Pure; every
/// check is evaluated in both directions, so swapping the arguments cannot
/// change the outcome. Exemption screening is the scanner's responsibility
/// and happens before this is called.
pub fn is_compatible(own: &Group, other: &Group) -> bool {
    member_counts_match(own, other)
        && genders_match(own, other)
        && ages_match(own, other)
        && heights_match(own, other)
        && within_distance(own, other)
}

fn member_counts_match(own: &Group, other: &Group) -> bool {
    own.member_count() == other.member_count()
}

fn gender(group: &Group) -> &str {
    group
        .filters
        .group_gender
        .as_deref()
        .unwrap_or(DEFAULT_GROUP_GENDER)
}

fn preferred_gender(group: &Group) -> &str {
    group
        .filters
        .preferred_gender
        .as_deref()
        .unwrap_or(UNRESTRICTED_GENDER)
}

fn accepts(preference: &str, candidate_gender: &str) -> bool {
    preference == UNRESTRICTED_GENDER || preference == candidate_gender
}

fn genders_match(own: &Group, other: &Group) -> bool {
    accepts(preferred_gender(own), gender(other)) && accepts(preferred_gender(other), gender(own))
}

fn ages_match(own: &Group, other: &Group) -> bool {
    let own_avg = own.filters.average_age.unwrap_or(0.0);
    let other_avg = other.filters.average_age.unwrap_or(0.0);
    in_bounds(
        other_avg,
        own.filters.min_age.unwrap_or(DEFAULT_MIN_AGE),
        own.filters.max_age.unwrap_or(DEFAULT_MAX_AGE),
    ) && in_bounds(
        own_avg,
        other.filters.min_age.unwrap_or(DEFAULT_MIN_AGE),
        other.filters.max_age.unwrap_or(DEFAULT_MAX_AGE),
    )
}

fn heights_match(own: &Group, other: &Group) -> bool {
    let own_avg = own.filters.average_height.unwrap_or(0.0);
    let other_avg = other.filters.average_height.unwrap_or(0.0);
    in_bounds(
        other_avg,
        own.filters.min_height.unwrap_or(DEFAULT_MIN_HEIGHT),
        own.filters.max_height.unwrap_or(DEFAULT_MAX_HEIGHT),
    ) && in_bounds(
        own_avg,
        other.filters.min_height.unwrap_or(DEFAULT_MIN_HEIGHT),
        other.filters.max_height.unwrap_or(DEFAULT_MAX_HEIGHT),
    )
}

fn in_bounds(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

fn coordinates(group: &Group) -> (f64, f64) {
    (
        group.filters.latitude.unwrap_or(0.0),
        group.filters.longitude.unwrap_or(0.0),
    )
}

/// A zero coordinate on either side means "location unknown" and the
/// distance check is skipped entirely rather than treated as a failure.
fn within_distance(own: &Group, other: &Group) -> bool {
    let (own_lat, own_lon) = coordinates(own);
    let (other_lat, other_lon) = coordinates(other);
    if own_lat == 0.0 || own_lon == 0.0 || other_lat == 0.0 || other_lon == 0.0 {
        return true;
    }

    let distance = haversine_km(own_lat, own_lon, other_lat, other_lon);
    distance
        <= own
            .filters
            .max_distance_km
            .unwrap_or(DEFAULT_MAX_DISTANCE_KM)
        && distance
            <= other
                .filters
                .max_distance_km
                .unwrap_or(DEFAULT_MAX_DISTANCE_KM)
}

/// Great-circle distance between two latitude/longitude points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
