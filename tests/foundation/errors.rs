//! Integration tests for error reporting

use shardhold_foundation::{CharacterId, EntityHandle, Error, ErrorContext, ErrorKind, MapId};

#[test]
fn error_message_names_the_kind() {
    let err = Error::map_unavailable(MapId(12));
    assert_eq!(err.to_string(), "map unavailable: 12");
}

#[test]
fn identity_mismatch_reports_both_ids() {
    let err = Error::identity_mismatch(CharacterId(3), Some(CharacterId(4)));

    match err.kind {
        ErrorKind::IdentityMismatch { expected, found } => {
            assert_eq!(expected, CharacterId(3));
            assert_eq!(found, Some(CharacterId(4)));
        }
        other => panic!("unexpected kind: {other:?}"),
    }
}

#[test]
fn duplicate_character_keeps_both_handles() {
    let existing = EntityHandle::new(1, 1);
    let rejected = EntityHandle::new(2, 1);
    let err = Error::duplicate_character(CharacterId(9), existing, rejected);

    assert!(err.to_string().contains("duplicate character 9"));
    assert!(matches!(
        err.kind,
        ErrorKind::DuplicateCharacter { existing: e, rejected: r, .. }
            if e == existing && r == rejected
    ));
}

#[test]
fn context_is_attached_and_rendered() {
    let err = Error::codec("bad record").with_context(
        ErrorContext::new()
            .with_operation("hydrate")
            .with_character(CharacterId(5))
            .with_map(MapId(2)),
    );

    let context = err.context.as_ref().unwrap();
    assert_eq!(context.to_string(), "in hydrate character=5 map=2");
    assert_eq!(err.to_string(), "codec failure: bad record");
}

#[test]
fn errors_propagate_with_question_mark() {
    fn lookup(ok: bool) -> shardhold_foundation::Result<u32> {
        if ok {
            Ok(1)
        } else {
            Err(Error::snapshot("truncated"))
        }
    }

    fn outer() -> shardhold_foundation::Result<u32> {
        let value = lookup(false)?;
        Ok(value + 1)
    }

    assert!(matches!(outer().unwrap_err().kind, ErrorKind::Snapshot(_)));
}
