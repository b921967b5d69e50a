//! Overlay merger: produce the differ's target by left-joining validated
//! data onto extracted data.
//!
//! The base defines a fixed topology. Keys the base does not have are never
//! added, keys the overlay does not have are kept unchanged, and preserved
//! keys always keep the base value no matter what the overlay says. Both
//! sides being ordered containers replaces atomically - no index merge -
//! which is the other half of the differ's `atomic`/`reference` default.
//!
//! Merging is lazy: a new container is materialized only on the first
//! actual divergence. An unchanged subtree keeps the base's shared payload,
//! so reference-identity array diffing still sees it as untouched.

use std::rc::Rc;

use crate::data::{same_value, Data, Entries};
use crate::options::PreservedKeys;

/// Merge `overlay` onto `base`.
///
/// Both are expected to be keyed containers; any other pairing returns the
/// base unchanged (fixed topology, fail-soft).
pub fn apply_overlay(base: &Data, overlay: &Data, preserved: &PreservedKeys) -> Data {
    match (base, overlay) {
        (Data::Obj(b), Data::Obj(o)) => match merge_entries(b, o, preserved) {
            Some(merged) => Data::Obj(merged),
            None => base.clone(),
        },
        _ => base.clone(),
    }
}

/// Merge one keyed level. `None` means nothing diverged and the base
/// payload can be reused as-is.
fn merge_entries(
    base: &Rc<Entries>,
    overlay: &Rc<Entries>,
    preserved: &PreservedKeys,
) -> Option<Rc<Entries>> {
    if Rc::ptr_eq(base, overlay) {
        return None;
    }
    let mut out: Option<Entries> = None;
    for (i, (key, base_value)) in base.iter().enumerate() {
        let merged = if preserved.contains(key) {
            // Base wins unconditionally for preserved keys.
            None
        } else {
            match overlay.get(key) {
                None => None,
                Some(overlay_value) => merge_value(base_value, overlay_value, preserved),
            }
        };
        match merged {
            Some(new_value) => {
                let map = out.get_or_insert_with(|| {
                    base.iter()
                        .take(i)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                });
                map.insert(key.clone(), new_value);
            }
            None => {
                if let Some(map) = &mut out {
                    map.insert(key.clone(), base_value.clone());
                }
            }
        }
    }
    out.map(Rc::new)
}

/// Merge one shared slot. `None` means the base value stands.
fn merge_value(base: &Data, overlay: &Data, preserved: &PreservedKeys) -> Option<Data> {
    if same_value(base, overlay) {
        return None;
    }
    match (base, overlay) {
        // Ordered containers replace wholesale; no index merge.
        (Data::Arr(_), Data::Arr(_)) => Some(overlay.clone()),
        (Data::Obj(b), Data::Obj(o)) => merge_entries(b, o, preserved).map(Data::Obj),
        _ => Some(overlay.clone()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
