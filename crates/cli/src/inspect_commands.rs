use {
    anyhow::Result,
    msgkit_commands::{FixtureRoster, Roster, roster},
    msgkit_protocol::Member,
};

use crate::repl_commands::{BOT_ADDRESS, BOT_INBOX, USER_ADDRESS, USER_INBOX};

pub fn print_commands() -> Result<()> {
    let registry = msgkit_group::registry()?;
    println!("{}", registry.help_text());
    Ok(())
}

/// Roster of the playground group as seen by its user, fixtures included.
fn playground_roster() -> Roster {
    let members = [
        Member::new(BOT_INBOX, BOT_ADDRESS),
        Member::new(USER_INBOX, USER_ADDRESS),
    ];
    roster::resolve(
        &members,
        roster::Perspective {
            client_address: BOT_ADDRESS,
            client_inbox_id: BOT_INBOX,
            sender_id: USER_INBOX,
        },
        &FixtureRoster::demo(),
    )
}

pub fn print_parse(text: &str) -> Result<()> {
    let registry = msgkit_group::registry()?;
    let intent = msgkit_commands::parse(text, &registry, &playground_roster());
    println!("{}", serde_json::to_string_pretty(&intent)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, msgkit_commands::IntentKind};

    #[test]
    fn playground_roster_knows_everyone() {
        let roster = playground_roster();
        assert_eq!(roster.sender().unwrap().inbox_id, USER_INBOX);
        assert!(roster.bot().is_some());
        for alias in ["@alix", "@eva", "@bo"] {
            assert!(roster.find_by_mention(alias).is_some(), "{alias}");
        }
    }

    #[test]
    fn parse_output_is_json() {
        let registry = msgkit_group::registry().unwrap();
        let intent = msgkit_commands::parse("/add @alix @eva", &registry, &playground_roster());
        assert_eq!(intent.kind(), IntentKind::Command);
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["trigger"], "/add");
        assert_eq!(json["params"]["users"]["value"][1]["alias"], "eva");
    }
}
