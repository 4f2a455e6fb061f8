use routerecon_engine::cell_id::CellRef;
use routerecon_engine::Workbook;
use routerecon_payload::{IdSeed, Partition};

/// Where the previous session left its highest IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataLayout {
    pub sheet: String,
    pub vq_cell: CellRef,
    pub other_cell: CellRef,
}

impl Default for MetadataLayout {
    fn default() -> Self {
        Self {
            sheet: "Metadata".into(),
            vq_cell: CellRef::new(0, 1),
            other_cell: CellRef::new(1, 1),
        }
    }
}

/// Read the ID seeds from the Metadata sheet.
///
/// Never fails: a missing sheet, an empty cell or a non-numeric value leaves
/// that partition unseeded (so it starts from the floor) and adds a warning.
pub fn read_seed(workbook: &Workbook, layout: &MetadataLayout) -> (IdSeed, Vec<String>) {
    let mut seed = IdSeed::default();
    let mut warnings = Vec::new();

    let Some(sheet) = workbook.sheet(&layout.sheet) else {
        warnings.push(format!("no '{}' sheet; ID counters start from the floor", layout.sheet));
        log::warn!("{}", warnings[0]);
        return (seed, warnings);
    };

    for (partition, at) in [(Partition::Vq, layout.vq_cell), (Partition::Other, layout.other_cell)] {
        match sheet.get_ref(at).and_then(|cell| cell.text()) {
            None => warnings.push(format!("{}!{at} is empty; {partition} IDs start from the floor", layout.sheet)),
            Some(text) => {
                if !seed.observe(partition, &text) {
                    warnings.push(format!(
                        "{}!{at} holds '{text}', not a whole number; {partition} IDs start from the floor",
                        layout.sheet
                    ));
                }
            }
        }
    }

    for warning in &warnings {
        log::warn!("{warning}");
    }
    log::debug!("metadata seed: {seed:?}");
    (seed, warnings)
}
