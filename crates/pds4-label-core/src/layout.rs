use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

use pds4_label_config::{HostMarkers, Placement, SegmentSettings};
use pds4_template::{Mutation, Occurrence, Template};
use tracing::{debug, info, warn};

use crate::error::{LabelError, LabelResult};
use crate::info::SegmentKind;
use crate::markers;

/// Sub-templates keyed by segment kind, restricted to a configured range.
#[derive(Debug, Clone)]
pub struct SegmentCatalog {
    kinds: RangeInclusive<SegmentKind>,
    templates: BTreeMap<SegmentKind, Template>,
}

impl SegmentCatalog {
    pub fn new(kinds: RangeInclusive<SegmentKind>) -> Self {
        Self {
            kinds,
            templates: BTreeMap::new(),
        }
    }

    /// Load every sub-template of the configured range found in `directory`.
    ///
    /// Kinds without a file stay unconfigured and only fail when a data file
    /// actually contains them.
    pub fn load(directory: &Path, settings: &SegmentSettings) -> LabelResult<Self> {
        if !directory.is_dir() {
            return Err(LabelError::io(
                directory,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "segment configuration directory does not exist",
                ),
            ));
        }

        let mut catalog = Self::new(settings.kinds.clone());
        for kind in settings.kinds.clone() {
            let path = directory.join(settings.file_name(kind));
            if !path.is_file() {
                debug!(kind, path = %path.display(), "no sub-template for segment kind");
                continue;
            }
            catalog.templates.insert(kind, Template::load(&path)?);
        }

        debug!(
            directory = %directory.display(),
            configured = catalog.templates.len(),
            "loaded segment catalog"
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, kind: SegmentKind, template: Template) -> LabelResult<()> {
        if !self.kinds.contains(&kind) {
            return Err(LabelError::UnconfiguredSegment { kind });
        }
        self.templates.insert(kind, template);
        Ok(())
    }

    pub fn get(&self, kind: SegmentKind) -> LabelResult<&Template> {
        if !self.kinds.contains(&kind) {
            return Err(LabelError::UnconfiguredSegment { kind });
        }
        self.templates
            .get(&kind)
            .ok_or(LabelError::UnconfiguredSegment { kind })
    }

    pub fn kinds(&self) -> impl Iterator<Item = SegmentKind> + '_ {
        self.templates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Where one segment kind ended up in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlacement {
    pub kind: SegmentKind,
    pub offset: u64,
    pub records: u64,
    pub record_length: u64,
}

impl SegmentPlacement {
    /// Byte volume of the segment, saturating at `u64::MAX`.
    pub fn bytes(&self) -> u64 {
        self.record_length.saturating_mul(self.records)
    }
}

/// Writes one parameterised sub-template per present segment kind into a
/// host label.
///
/// Kinds are laid out in ascending order; each kind's offset is the byte
/// volume of every lower kind present in the file. The group count is pinned
/// to zero.
pub struct LayoutAssembler<'a> {
    catalog: &'a SegmentCatalog,
    markers: HostMarkers,
    placement: Placement,
}

impl<'a> LayoutAssembler<'a> {
    pub fn new(catalog: &'a SegmentCatalog, markers: HostMarkers, placement: Placement) -> Self {
        Self {
            catalog,
            markers,
            placement,
        }
    }

    pub fn from_settings(catalog: &'a SegmentCatalog, settings: &SegmentSettings) -> Self {
        Self::new(catalog, settings.markers.clone(), settings.placement)
    }

    /// Compute every placement and its filled sub-template without touching
    /// the host. Fails on the first unconfigured kind or unreadable record
    /// length.
    pub fn plan<I>(&self, census: I) -> LabelResult<Vec<(SegmentPlacement, Template)>>
    where
        I: IntoIterator<Item = (SegmentKind, u64)>,
    {
        let mut counts: BTreeMap<SegmentKind, u64> = BTreeMap::new();
        for (kind, count) in census {
            let total = counts.entry(kind).or_insert(0);
            *total = total
                .checked_add(count)
                .ok_or(LabelError::OffsetOverflow { kind })?;
        }

        let mut offset: u64 = 0;
        let mut planned = Vec::with_capacity(counts.len());

        for (kind, records) in counts {
            let mut segment = self.catalog.get(kind)?.clone();

            let raw_length = segment.read(markers::RECORD_LENGTH, Occurrence::First)?;
            let record_length: u64 = raw_length
                .trim()
                .parse()
                .map_err(|_| LabelError::malformed(markers::RECORD_LENGTH, &raw_length))?;

            segment.replace(markers::OFFSET, &offset.to_string());
            segment.replace_first(markers::RECORDS, &records.to_string());
            segment.replace_first(markers::GROUPS, "0");

            let placement = SegmentPlacement {
                kind,
                offset,
                records,
                record_length,
            };
            offset = record_length
                .checked_mul(records)
                .and_then(|bytes| offset.checked_add(bytes))
                .ok_or(LabelError::OffsetOverflow { kind })?;

            planned.push((placement, segment));
        }

        Ok(planned)
    }

    /// Plan the layout, then insert each sub-template into `host`.
    pub fn assemble<I>(&self, host: &mut Template, census: I) -> LabelResult<Vec<SegmentPlacement>>
    where
        I: IntoIterator<Item = (SegmentKind, u64)>,
    {
        let planned = self.plan(census)?;
        if planned.is_empty() {
            warn!("file info lists no segments; label carries no table layouts");
        }

        let mut placements = Vec::with_capacity(planned.len());
        for (placement, segment) in planned {
            if let Mutation::Skipped = self.place(host, &segment) {
                warn!(
                    kind = placement.kind,
                    "host label has neither the table wrapper nor the file closing marker"
                );
            }
            info!(
                kind = placement.kind,
                offset = placement.offset,
                records = placement.records,
                bytes = placement.bytes(),
                "placed segment layout"
            );
            placements.push(placement);
        }

        Ok(placements)
    }

    fn place(&self, host: &mut Template, segment: &Template) -> Mutation {
        // Earlier insertions may have introduced the wrapper.
        let anchor = if host.contains(&self.markers.wrapper_open) {
            &self.markers.wrapper_close
        } else {
            &self.markers.file_close
        };

        let lines = segment.document().lines().iter().cloned();
        match self.placement {
            Placement::Before => host.insert_before(anchor, lines, Occurrence::Last),
            Placement::After => host.insert(anchor, lines, Occurrence::Last),
        }
    }
}
