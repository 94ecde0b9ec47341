use crate::normalize::{NormalizedPlay, OVERTIME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayText {
    pub score_line: String,
    pub clock_line: String,
    pub down_line: String,
}

/// `"3:45 2Q"`; overtime shows as `OT`.
pub fn clock_line(quarter: i64, clock_seconds: i64) -> String {
    let secs = clock_seconds.max(0);
    let period = if quarter >= OVERTIME {
        "OT".to_string()
    } else {
        format!("{quarter}Q")
    };
    format!("{}:{:02} {period}", secs / 60, secs % 60)
}

pub fn build_play_text(play: &NormalizedPlay) -> PlayText {
    let snap = &play.snapshot;
    let (home_score, away_score) = if snap.is_pos_home == 1 {
        (snap.posteam_score, snap.defteam_score)
    } else {
        (snap.defteam_score, snap.posteam_score)
    };
    PlayText {
        score_line: format!(
            "{} {away_score}  {} {home_score}",
            play.away_team, play.home_team
        ),
        clock_line: clock_line(play.quarter, play.clock_seconds),
        down_line: play.down_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{FollowingPlay, SourceKind};
    use crate::normalize::SituationSnapshot;

    fn play(is_pos_home: u8) -> NormalizedPlay {
        NormalizedPlay {
            snapshot: SituationSnapshot {
                week: 1,
                yardline_100: 30,
                half_seconds_remaining: 225,
                game_seconds_remaining: 2025,
                down: 2,
                goal_to_go: 0,
                ydstogo: 6,
                posteam_score: 10,
                defteam_score: 7,
                is_pos_home,
            },
            kind: SourceKind::Historical,
            play_label: "812".to_string(),
            home_team: "BUF".to_string(),
            away_team: "NYJ".to_string(),
            possessing_team: if is_pos_home == 1 { "BUF" } else { "NYJ" }.to_string(),
            defending_team: if is_pos_home == 1 { "NYJ" } else { "BUF" }.to_string(),
            quarter: 2,
            clock_seconds: 225,
            logo: None,
            down_text: "2nd & 6".to_string(),
            following: FollowingPlay::NotYetHappened,
            following_text: None,
        }
    }

    #[test]
    fn clock_pads_seconds() {
        assert_eq!(clock_line(2, 225), "3:45 2Q");
        assert_eq!(clock_line(4, 5), "0:05 4Q");
        assert_eq!(clock_line(1, 900), "15:00 1Q");
        assert_eq!(clock_line(5, 61), "1:01 OT");
    }

    #[test]
    fn scores_land_on_home_and_away() {
        assert_eq!(build_play_text(&play(1)).score_line, "NYJ 7  BUF 10");
        assert_eq!(build_play_text(&play(0)).score_line, "NYJ 10  BUF 7");
    }

    #[test]
    fn down_line_is_passed_through() {
        let text = build_play_text(&play(1));
        assert_eq!(text.down_line, "2nd & 6");
        assert_eq!(text.clock_line, "3:45 2Q");
    }
}
