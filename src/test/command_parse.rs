use crate::cmd::{Command, ParseError, parse_line};
use crate::fabric::{InputId, PortId};

fn route(input: u32, outputs: &[u32]) -> Command {
    Command::Route {
        input: InputId(input),
        outputs: outputs.iter().map(|&p| PortId(p)).collect(),
    }
}

#[test]
fn parses_route_and_clear_directives() {
    assert_eq!(parse_line("7.31.44.92"), Ok(vec![route(7, &[31, 44, 92])]));
    assert_eq!(
        parse_line("!7"),
        Ok(vec![Command::Clear { input: InputId(7) }])
    );
    assert_eq!(parse_line("  3.1  \r"), Ok(vec![route(3, &[1])]));
}

#[test]
fn parses_several_directives_and_comments() {
    assert_eq!(
        parse_line("3.1, !4 ,5.6.7 # trailing note"),
        Ok(vec![
            route(3, &[1]),
            Command::Clear { input: InputId(4) },
            route(5, &[6, 7]),
        ])
    );
    assert_eq!(parse_line("# only a comment"), Ok(vec![]));
}

#[test]
fn rejects_blank_and_malformed_lines() {
    assert_eq!(parse_line(""), Err(ParseError::Empty));
    assert_eq!(parse_line("   \t"), Err(ParseError::Empty));
    assert_eq!(parse_line("1.2,,3.4"), Err(ParseError::EmptyDirective));
    assert_eq!(parse_line("1.2,"), Err(ParseError::EmptyDirective));
    assert_eq!(
        parse_line("1"),
        Err(ParseError::MissingTargets { input: 1 })
    );
    assert_eq!(
        parse_line("1..2"),
        Err(ParseError::NotInteger {
            token: String::new()
        })
    );
    assert_eq!(
        parse_line("a.1"),
        Err(ParseError::NotInteger {
            token: "a".to_string()
        })
    );
    assert_eq!(
        parse_line("-1.2"),
        Err(ParseError::NotInteger {
            token: "-1".to_string()
        })
    );
    assert_eq!(
        parse_line("!"),
        Err(ParseError::NotInteger {
            token: String::new()
        })
    );
    assert_eq!(
        parse_line("1.99999999999"),
        Err(ParseError::NotInteger {
            token: "99999999999".to_string()
        })
    );
}

#[test]
fn malformed_directive_rejects_whole_line() {
    assert!(parse_line("1.2, x.3").is_err());
}

#[test]
fn command_display_matches_file_syntax() {
    assert_eq!(route(7, &[31, 44]).to_string(), "7.31.44");
    assert_eq!(Command::Clear { input: InputId(9) }.to_string(), "!9");

    let cmd: Command = "12.3.4".parse().expect("parse directive");
    assert_eq!(cmd.input(), InputId(12));
    assert_eq!(cmd.to_string(), "12.3.4");
}
