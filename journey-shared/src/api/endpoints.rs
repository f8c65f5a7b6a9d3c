use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn enc(s: &str) -> String {
    utf8_percent_encode(s, NON_ALPHANUMERIC).to_string()
}

/// `application/x-www-form-urlencoded` body from key/value pairs.
pub fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", enc(k), enc(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn register(base: &str) -> String {
    base_join(base, "/register")
}
pub fn login(base: &str) -> String {
    base_join(base, "/login")
}
pub fn logout(base: &str) -> String {
    base_join(base, "/logout")
}
pub fn profile_update(base: &str) -> String {
    base_join(base, "/profile/update")
}

pub fn missions(base: &str) -> String {
    base_join(base, "/missions")
}
pub fn mission(base: &str, id: i32) -> String {
    base_join(base, &format!("/missions/{id}"))
}
pub fn mission_complete(base: &str, id: i32) -> String {
    base_join(base, &format!("/missions/{id}/complete"))
}
pub fn mission_history(base: &str) -> String {
    base_join(base, "/missions/history/all")
}

pub fn quizzes(base: &str) -> String {
    base_join(base, "/quizzes")
}
pub fn quiz(base: &str, id: i32) -> String {
    base_join(base, &format!("/quizzes/{id}"))
}
pub fn quiz_submit(base: &str, id: i32) -> String {
    base_join(base, &format!("/quizzes/{id}/submit"))
}
pub fn quiz_result(base: &str, id: i32) -> String {
    base_join(base, &format!("/quizzes/{id}/result"))
}

pub fn games(base: &str) -> String {
    base_join(base, "/games")
}
pub fn games_search(base: &str, q: &str) -> String {
    base_join(base, &format!("/games/search?q={}", enc(q)))
}
pub fn game_complete(base: &str, id: i32) -> String {
    base_join(base, &format!("/games/{id}/complete"))
}
pub fn game_rate(base: &str, id: i32) -> String {
    base_join(base, &format!("/games/{id}/rate"))
}

pub fn activity_log(base: &str) -> String {
    base_join(base, "/api/activity-log")
}
pub fn friends(base: &str) -> String {
    base_join(base, "/api/friends")
}
pub fn friend_request(base: &str, user_id: i32) -> String {
    base_join(base, &format!("/api/friends/{user_id}/request"))
}
pub fn friend_accept(base: &str, user_id: i32) -> String {
    base_join(base, &format!("/api/friends/{user_id}/accept"))
}
pub fn starting_status(base: &str) -> String {
    base_join(base, "/api/starting/status")
}
pub fn starting_create(base: &str) -> String {
    base_join(base, "/api/starting/create")
}
pub fn ending_create(base: &str) -> String {
    base_join(base, "/api/ending/create")
}
pub fn journey_completion(base: &str) -> String {
    base_join(base, "/api/journey/completion-check")
}
pub fn points_history(base: &str, page: i64, per_page: i64) -> String {
    base_join(
        base,
        &format!("/api/points/history?page={page}&per_page={per_page}"),
    )
}

pub fn healthz(base: &str) -> String {
    base_join(base, "/healthz")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_without_double_slashes() {
        assert_eq!(
            mission_complete("http://h:1/", 7),
            "http://h:1/missions/7/complete"
        );
        assert_eq!(
            games_search("http://h", "tower defense"),
            "http://h/games/search?q=tower%20defense"
        );
    }

    #[test]
    fn form_body_escapes_reserved_characters() {
        assert_eq!(
            form_body(&[("email", "a+b@c.de"), ("passwordConfirm", "p&ss")]),
            "email=a%2Bb%40c%2Ede&passwordConfirm=p%26ss"
        );
    }
}
