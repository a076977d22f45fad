use crate::geom::{ParseError, Site, Structure};

fn batio3() -> Structure {
    Structure::new(
        [[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]],
        vec![
            Site::new("Ba", 0.0, 0.0, 0.0),
            Site::new("Ti", 2.0, 2.0, 2.0),
            Site::new("O", 2.0, 2.0, 0.0),
            Site::new("O", 2.0, 0.0, 2.0),
            Site::new("O", 0.0, 2.0, 2.0),
        ],
    )
}

#[test]
fn test_from_str() {
    let got = "
4.0 0.0 0.0
0.0 4.0 0.0
0.0 0.0 4.0

Ba 0.0 0.0 0.0
Ti 2.0 2.0 2.0
O  2.0 2.0 0.0
O  2.0 0.0 2.0
O  0.0 2.0 2.0
"
    .parse::<Structure>()
    .unwrap();
    assert_eq!(got, batio3());
    assert_eq!(got.len(), 5);
    assert_eq!(
        got.kind_names().collect::<Vec<_>>(),
        ["Ba", "Ti", "O", "O", "O"]
    );
}

#[test]
fn test_display_round_trip() {
    let want = batio3();
    let got: Structure = want.to_string().parse().unwrap();
    assert_eq!(got, want);
}

#[test]
fn test_no_sites() {
    let got: Structure = "1 0 0\n0 1 0\n0 0 1\n".parse().unwrap();
    assert!(got.is_empty());
    assert_eq!(got, Structure::cubic(1.0));
}

#[test]
fn test_parse_errors() {
    let tests = [
        ("1 0 0\n0 1 0\n", ParseError::MissingCell(2)),
        (
            "1 0 0\n0 x 0\n0 0 1\n",
            ParseError::Cell {
                line: 2,
                text: "0 x 0".into(),
            },
        ),
        (
            "1 0 0\n0 1 0\n0 0 1 1\n",
            ParseError::Cell {
                line: 3,
                text: "0 0 1 1".into(),
            },
        ),
        (
            "1 0 0\n0 1 0\n0 0 1\n\nH 0.0 0.0\n",
            ParseError::Site {
                line: 5,
                text: "H 0.0 0.0".into(),
            },
        ),
    ];
    for (input, want) in tests {
        let got = input.parse::<Structure>().unwrap_err();
        assert_eq!(got, want, "{input}");
    }
}

#[test]
fn test_json() {
    let got: Structure = serde_json::from_str(
        r#"{"cell": [[4, 0, 0], [0, 4, 0], [0, 0, 4]],
            "sites": [{"kind_name": "Ba", "position": [0, 0, 0]}]}"#,
    )
    .unwrap();
    let mut want = Structure::cubic(4.0);
    want.append_site(Site::new("Ba", 0.0, 0.0, 0.0));
    assert_eq!(got, want);
}
