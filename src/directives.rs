use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Index into an [`AssetSet`], stable for the lifetime of the set.
pub type AssetId = usize;

/// A named raster diagram supplied by the input surface.
///
/// The core only needs the intrinsic size for layout; pixel data stays with
/// the raster backend, keyed by the same [`AssetId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramAsset {
    /// Filename key used by directive lines.
    pub name: String,
    /// Intrinsic width in pixels.
    pub width: u32,
    /// Intrinsic height in pixels.
    pub height: u32,
}

/// Insertion-ordered set of uploaded diagram assets, keyed by filename.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSet {
    assets: Vec<DiagramAsset>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset, returning its id.
    ///
    /// Re-uploading under an existing name replaces the earlier entry and
    /// keeps its id, so directive resolution always sees the latest upload.
    pub fn insert(&mut self, asset: DiagramAsset) -> AssetId {
        if let Some(id) = self.lookup(&asset.name) {
            self.assets[id] = asset;
            return id;
        }
        self.assets.push(asset);
        self.assets.len() - 1
    }

    pub fn get(&self, id: AssetId) -> Option<&DiagramAsset> {
        self.assets.get(id)
    }

    /// Resolve a filename key to its id.
    pub fn lookup(&self, name: &str) -> Option<AssetId> {
        self.assets.iter().position(|asset| asset.name == name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetId, &DiagramAsset)> {
        self.assets.iter().enumerate()
    }
}

type PlacementList = SmallVec<[AssetId; 2]>;

/// Mapping from 1-based wrapped-line index to the ordered assets rendered
/// immediately before that line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagramIndex {
    placements: BTreeMap<u32, PlacementList>,
}

impl DiagramIndex {
    /// Parse a directive text against the uploaded asset set.
    ///
    /// One entry per line, `filename:n1,n2,...`. Split on the first `:`;
    /// the filename is trimmed and looked up in `assets`. Unknown filenames,
    /// colon-less lines, and tokens that do not parse as non-negative
    /// integers are skipped without error; this leniency is deliberate and
    /// part of the observable contract. Declaration order is preserved when
    /// several directive lines target the same line index.
    pub fn parse(directives: &str, assets: &AssetSet) -> Self {
        let mut placements: BTreeMap<u32, PlacementList> = BTreeMap::new();
        for raw in directives.lines() {
            let Some((name, numbers)) = raw.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let Some(id) = assets.lookup(name) else {
                log::debug!("diagram directive for unknown asset {name:?}, skipped");
                continue;
            };
            for token in numbers.split(',') {
                let Ok(line_no) = token.trim().parse::<u32>() else {
                    log::debug!("malformed line token {token:?} for asset {name:?}, skipped");
                    continue;
                };
                placements.entry(line_no).or_default().push(id);
            }
        }
        Self { placements }
    }

    /// Assets to render immediately before `line_no` (1-based), in
    /// declaration order. Empty when the line has no placements.
    pub fn assets_for_line(&self, line_no: u32) -> &[AssetId] {
        self.placements
            .get(&line_no)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of individual placements.
    pub fn placement_count(&self) -> usize {
        self.placements.values().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(names: &[&str]) -> AssetSet {
        let mut assets = AssetSet::new();
        for name in names {
            assets.insert(DiagramAsset {
                name: (*name).to_string(),
                width: 100,
                height: 80,
            });
        }
        assets
    }

    #[test]
    fn parses_single_binding() {
        let assets = set_with(&["diagram.png"]);
        let index = DiagramIndex::parse("diagram.png:3", &assets);
        assert_eq!(index.assets_for_line(3), &[0]);
        assert_eq!(index.assets_for_line(2), &[] as &[AssetId]);
    }

    #[test]
    fn multiple_lines_and_targets() {
        let assets = set_with(&["a.png", "b.png"]);
        let index = DiagramIndex::parse("a.png:1,4\nb.png:4", &assets);
        assert_eq!(index.assets_for_line(1), &[0]);
        assert_eq!(index.assets_for_line(4), &[0, 1]);
        assert_eq!(index.placement_count(), 3);
    }

    #[test]
    fn unknown_asset_is_silently_dropped() {
        let assets = set_with(&["a.png"]);
        let index = DiagramIndex::parse("missing.png:2", &assets);
        assert!(index.is_empty());
    }

    #[test]
    fn malformed_tokens_are_silently_dropped() {
        let assets = set_with(&["a.png"]);
        let index = DiagramIndex::parse("a.png:1,x,-3,2.5, 7 \nno colon here", &assets);
        assert_eq!(index.assets_for_line(1), &[0]);
        assert_eq!(index.assets_for_line(7), &[0]);
        assert_eq!(index.placement_count(), 2);
    }

    #[test]
    fn filename_whitespace_is_trimmed() {
        let assets = set_with(&["a.png"]);
        let index = DiagramIndex::parse("  a.png : 2", &assets);
        assert_eq!(index.assets_for_line(2), &[0]);
    }

    #[test]
    fn reupload_replaces_in_place() {
        let mut assets = set_with(&["a.png"]);
        let id = assets.insert(DiagramAsset {
            name: "a.png".to_string(),
            width: 300,
            height: 200,
        });
        assert_eq!(id, 0);
        assert_eq!(assets.len(), 1);
        assert_eq!(assets.get(0).map(|a| a.width), Some(300));
    }
}
