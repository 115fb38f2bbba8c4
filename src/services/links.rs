//! Invite links handed out by the owner and parsed back on join.

use crate::dao::ids::{GameId, InvalidId};

const GAME_ID_PARAM: &str = "gameId";

/// Link the owner keeps for itself.
pub fn build_owner_link(base: &str, game_id: GameId) -> String {
    format!("{}{GAME_ID_PARAM}={game_id}", query_prefix(base))
}

/// `<base>?gameId=<id>&role=participant`
pub fn build_participant_link(base: &str, game_id: GameId) -> String {
    format!("{}&role=participant", build_owner_link(base, game_id))
}

/// `<base>?gameId=<id>&role=participant&mode=game`
pub fn build_game_view_link(base: &str, game_id: GameId) -> String {
    format!("{}&mode=game", build_participant_link(base, game_id))
}

/// Accept either a bare game id (current or legacy form) or any link carrying
/// a `gameId` query parameter.
pub fn parse_invite(input: &str) -> Result<GameId, InvalidId> {
    let input = input.trim();
    let Some((_, query)) = input.split_once('?') else {
        return input.parse();
    };

    query
        .split('#')
        .next()
        .unwrap_or_default()
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == GAME_ID_PARAM)
        .map(|(_, value)| value.parse())
        .unwrap_or_else(|| {
            Err(InvalidId {
                input: input.to_string(),
                kind: "game",
            })
        })
}

fn query_prefix(base: &str) -> String {
    match base.find('?') {
        Some(pos) if pos + 1 == base.len() => base.to_string(),
        Some(_) => format!("{base}&"),
        None => format!("{base}?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    fn game_id() -> GameId {
        ID.parse().unwrap()
    }

    #[test]
    fn links_carry_role_and_mode() {
        let base = "https://til.example/play";
        assert_eq!(
            build_owner_link(base, game_id()),
            format!("{base}?gameId={ID}")
        );
        assert_eq!(
            build_participant_link(base, game_id()),
            format!("{base}?gameId={ID}&role=participant")
        );
        assert_eq!(
            build_game_view_link(base, game_id()),
            format!("{base}?gameId={ID}&role=participant&mode=game")
        );
    }

    #[test]
    fn base_with_existing_query_is_extended() {
        assert_eq!(
            build_owner_link("https://til.example/?lang=fr", game_id()),
            format!("https://til.example/?lang=fr&gameId={ID}")
        );
    }

    #[test]
    fn invite_parsing_accepts_links_and_bare_ids() {
        let link = build_game_view_link("https://til.example/", game_id());
        assert_eq!(parse_invite(&link).unwrap(), game_id());
        assert_eq!(parse_invite(ID).unwrap(), game_id());
        assert_eq!(parse_invite(&format!("{ID}.json")).unwrap(), game_id());
        assert!(parse_invite("https://til.example/?role=participant").is_err());
        assert!(parse_invite("not-a-game").is_err());
    }
}
