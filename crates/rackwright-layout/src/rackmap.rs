//! Room floor plan.
//!
//! Racks are placed on a grid of cells: walls around the room, walkable aisles around the racks,
//! one grid row per range. Facing ranges are separated by a regular path, back-to-back ranges by a
//! narrower hot aisle.

use rackwright_core::{Diagnostics, Rack, RackSet, RoomConfig, WarningKind};
use rustc_hash::FxHashSet;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Wall,
    Rack(String),
}

impl Cell {
    pub fn is_walkable(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn rack_name(&self) -> Option<&str> {
        match self {
            Cell::Rack(name) => Some(name),
            _ => None,
        }
    }
}

/// Serialized the way map consumers expect it: `0` walkable, `1` wall, otherwise the rack name.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_u8(0),
            Cell::Wall => serializer.serialize_u8(1),
            Cell::Rack(name) => serializer.serialize_str(name),
        }
    }
}

/// Where a rack landed on the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RackCell {
    pub name: String,
    pub range_index: usize,
    /// Position of the rack within its range, as ingested.
    pub rack_index: usize,
    /// Column within the rack area, before aisles and walls are added.
    pub column: usize,
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomGrid {
    pub width: usize,
    pub height: usize,
    /// Highest rack unit used by any node in the room.
    pub altitude: f64,
    /// Row-major cells, `width * height` long.
    pub data: Vec<Cell>,
    pub placements: Vec<RackCell>,
    /// Grid row of each range, in range order.
    pub range_rows: Vec<usize>,
}

impl RoomGrid {
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.data.chunks(self.width.max(1))
    }

    pub fn placement(&self, rack: &str) -> Option<&RackCell> {
        self.placements.iter().find(|p| p.name == rack)
    }
}

pub fn find_range_number(racks: &RackSet) -> usize {
    racks.ranges.len()
}

pub fn find_range_max_racks_number(racks: &RackSet) -> usize {
    racks.ranges.iter().map(|r| r.racks.len()).max().unwrap_or(0)
}

pub fn find_min_posx(racks: &RackSet) -> Option<i64> {
    racks.racks().map(|r| r.posx).min()
}

pub fn find_max_posx(racks: &RackSet) -> Option<i64> {
    racks.racks().map(|r| r.posx).max()
}

/// Rows inserted after range `index` when another range follows it.
fn gap_after_range(index: usize, config: &RoomConfig) -> usize {
    if index % 2 == 0 {
        config.hot_aisle_width
    } else {
        config.path_width
    }
}

/// Column of every rack of a range, relative to the leftmost rack of the room. Two racks claiming
/// the same column keep their order and the later one slides right.
fn range_columns<'a>(
    racks: &'a [Rack],
    min_posx: i64,
    diag: &mut Diagnostics,
) -> Vec<(usize, usize, &'a Rack)> {
    let mut ordered: Vec<(usize, &Rack)> = racks.iter().enumerate().collect();
    ordered.sort_by(|(_, a), (_, b)| a.posx.cmp(&b.posx).then_with(|| a.name.cmp(&b.name)));

    let mut used = FxHashSet::default();
    let mut out = Vec::with_capacity(ordered.len());
    for (rack_index, rack) in ordered {
        let wanted = usize::try_from(rack.posx - min_posx).unwrap_or(0);
        let mut column = wanted;
        while used.contains(&column) {
            column += 1;
        }
        if column != wanted {
            diag.warn(
                WarningKind::RackColumnConflict,
                rack.name.clone(),
                format!(
                    "column {wanted} of range {} is taken, moved to column {column}",
                    rack.range
                ),
            );
        }
        used.insert(column);
        out.push((column, rack_index, rack));
    }
    out
}

pub fn racks_to_grid(racks: &RackSet, config: &RoomConfig, diag: &mut Diagnostics) -> RoomGrid {
    let path = config.path_width;
    let min_posx = find_min_posx(racks).unwrap_or(0);

    let columns: Vec<Vec<(usize, usize, &Rack)>> = racks
        .ranges
        .iter()
        .map(|range| range_columns(&range.racks, min_posx, diag))
        .collect();
    let content_width = columns
        .iter()
        .flatten()
        .map(|(column, _, _)| column + 1)
        .max()
        .unwrap_or(0);
    let width = content_width + 2 * path + 2;

    let mut data: Vec<Cell> = Vec::new();
    let mut height = 0usize;
    let push_wall_row = |data: &mut Vec<Cell>, height: &mut usize| {
        data.extend(std::iter::repeat_n(Cell::Wall, width));
        *height += 1;
    };
    let push_aisle_rows = |data: &mut Vec<Cell>, height: &mut usize, count: usize| {
        for _ in 0..count {
            data.push(Cell::Wall);
            data.extend(std::iter::repeat_n(Cell::Empty, width - 2));
            data.push(Cell::Wall);
            *height += 1;
        }
    };

    push_wall_row(&mut data, &mut height);
    push_aisle_rows(&mut data, &mut height, path);

    let mut placements = Vec::with_capacity(racks.rack_count());
    let mut range_rows = Vec::with_capacity(columns.len());
    for (range_index, range) in columns.iter().enumerate() {
        if range_index > 0 {
            push_aisle_rows(&mut data, &mut height, gap_after_range(range_index - 1, config));
        }
        let y = height;
        let mut row = vec![Cell::Empty; width];
        row[0] = Cell::Wall;
        row[width - 1] = Cell::Wall;
        for (column, rack_index, rack) in range {
            let x = 1 + path + column;
            row[x] = Cell::Rack(rack.name.clone());
            placements.push(RackCell {
                name: rack.name.clone(),
                range_index,
                rack_index: *rack_index,
                column: *column,
                x,
                y,
            });
        }
        data.extend(row);
        height += 1;
        range_rows.push(y);
    }

    push_aisle_rows(&mut data, &mut height, path);
    push_wall_row(&mut data, &mut height);

    tracing::debug!(width, height, racks = placements.len(), "room grid built");

    RoomGrid {
        width,
        height,
        altitude: racks.altitude(),
        data,
        placements,
        range_rows,
    }
}
