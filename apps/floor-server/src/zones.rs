// Office floor layout: four department zones in a 2x2 grid.
//
// +-------------------+-------------------+
// |     DESIGNING     |    DOCUMENTING    |
// |   (BA, PM, Cust)  |    (Architect)    |
// +-------------------+-------------------+
// |      CODING       |      TESTING      |
// |    (Developer)    |       (QA)        |
// +-------------------+-------------------+

/// Home zone for a role. Unknown roles use the role string itself as their
/// zone; zone names are never hard-validated anywhere downstream.
pub fn home_zone(role: &str) -> &str {
    match role {
        "customer" | "ba" | "pm" => "designing",
        "architect" => "documenting",
        "developer" => "coding",
        "qa" => "testing",
        other => other,
    }
}

/// Anchor coordinates for a zone. Cosmetic only: the core never moves
/// agents in x/y, the dashboard animates between anchors on its own.
pub fn zone_anchor(zone: &str) -> (f64, f64) {
    match zone {
        "designing" => (200.0, 200.0),
        "documenting" => (600.0, 200.0),
        "coding" => (200.0, 500.0),
        "testing" => (600.0, 500.0),
        _ => (0.0, 0.0),
    }
}
