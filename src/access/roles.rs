/*!
 * Role Ranking
 * Fixed total order over the platform's built-in roles
 */

use smartstring::alias::String as SmartString;

/// Rank of a role name. Unknown roles rank with "norole".
pub fn role_rank(role: &str) -> u8 {
    match role {
        "subscriber" => 1,
        "contributor" => 2,
        "author" => 3,
        "editor" => 4,
        "administrator" => 5,
        _ => 0,
    }
}

/// Highest rank across a subject's roles; 0 when they have none
pub fn highest_rank(roles: &[SmartString]) -> u8 {
    roles.iter().map(|role| role_rank(role)).max().unwrap_or(0)
}
