#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use padarea_core::Rect;
use padarea_runtime::CalibrationSession;

#[derive(Debug, Arbitrary)]
enum Edit {
    OffsetX(f64),
    OffsetY(f64),
    SizeX(f64),
    SizeY(f64),
    Aspect(f64),
    Lock(bool),
    Turn,
    Settle,
    Reset,
}

fuzz_target!(|edits: Vec<Edit>| {
    let session = CalibrationSession::default();

    for edit in edits.iter().take(256) {
        match *edit {
            Edit::OffsetX(v) => {
                session.set_offset_x(v);
            }
            Edit::OffsetY(v) => {
                session.set_offset_y(v);
            }
            Edit::SizeX(v) => {
                session.set_size_x(v);
            }
            Edit::SizeY(v) => {
                session.set_size_y(v);
            }
            Edit::Aspect(v) => {
                session.set_aspect_ratio(v);
            }
            Edit::Lock(locked) => {
                session.set_locked(locked);
            }
            Edit::Turn => {
                session.run_turn();
            }
            Edit::Settle => {
                session.settle();
            }
            Edit::Reset => session.reset_to_defaults(),
        }

        // Post-conditions that must hold after every edit.
        let config = session.config();
        let offset = session.current_offset();
        let size = session.current_size();
        let ratio = session.current_aspect_ratio();
        assert!(config.offset_range.contains(offset.x), "offset.x OOB: {offset:?}");
        assert!(config.offset_range.contains(offset.y), "offset.y OOB: {offset:?}");
        assert!(config.size_range.contains(size.x), "size.x OOB: {size:?}");
        assert!(config.size_range.contains(size.y), "size.y OOB: {size:?}");
        assert!(config.aspect_range.contains(ratio), "ratio OOB: {ratio}");
        assert_eq!(
            session.within_bounds(),
            session.is_within_bounds(config.reference_rect()),
            "cached bounds flag out of date"
        );
    }

    session.settle();
    assert!(!session.pending_correction(), "correction left pending after settle");

    // The label never divides by zero.
    let _ = session.area_label().to_string();
    let _ = session.is_within_bounds(Rect::from_size(1.0, 1.0));
});
