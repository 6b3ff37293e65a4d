//! Static starter layout for empty legacy documents.
//!
//! Only consulted by the `legacy_layout_collections` step, and only when a
//! stored document has no beds and no season data at all.

use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutBed {
    pub id: &'static str,
    pub name: &'static str,
    /// Legacy bed status (`rotation` or `perennial`).
    pub status: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStructure {
    pub id: &'static str,
    pub name: &'static str,
    /// Legacy infrastructure type.
    pub kind: &'static str,
}

/// Read-only layout fixture in the legacy triplet shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLayout {
    pub beds: &'static [LayoutBed],
    pub infrastructure: &'static [LayoutStructure],
}

impl DefaultLayout {
    /// Renders the fixture as a legacy `layout` object.
    pub fn to_legacy_layout(&self) -> Value {
        let beds: Vec<Value> = self
            .beds
            .iter()
            .map(|bed| json!({ "id": bed.id, "name": bed.name, "status": bed.status }))
            .collect();
        let infrastructure: Vec<Value> = self
            .infrastructure
            .iter()
            .map(|item| json!({ "id": item.id, "name": item.name, "type": item.kind }))
            .collect();

        json!({
            "beds": beds,
            "permanentPlantings": [],
            "infrastructure": infrastructure,
        })
    }
}

pub static DEFAULT_LAYOUT: DefaultLayout = DefaultLayout {
    beds: &[
        LayoutBed { id: "A", name: "Bed A", status: "rotation" },
        LayoutBed { id: "B1", name: "Bed B1", status: "rotation" },
        LayoutBed { id: "B2", name: "Bed B2", status: "rotation" },
        LayoutBed { id: "B1-prime", name: "Bed B1'", status: "rotation" },
        LayoutBed { id: "B2-prime", name: "Bed B2'", status: "rotation" },
        LayoutBed { id: "C", name: "Bed C", status: "rotation" },
        LayoutBed { id: "D", name: "Bed D", status: "rotation" },
        LayoutBed { id: "E", name: "Bed E", status: "rotation" },
        LayoutBed { id: "raspberries", name: "Raspberries", status: "perennial" },
    ],
    infrastructure: &[
        LayoutStructure { id: "shed", name: "Shed", kind: "shed" },
        LayoutStructure { id: "compost", name: "Compost Bays", kind: "compost" },
        LayoutStructure { id: "water-butt", name: "Water Butt", kind: "water-butt" },
    ],
};
