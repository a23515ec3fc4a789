/// A fixed-size 2D grid addressed with signed coordinates.
///
/// Generation passes routinely probe one or two tiles past the edge of the
/// map, so every accessor takes `i32` coordinates and treats anything outside
/// `[0, width) x [0, height)` as absent instead of wrapping or panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Whether `(x, y)` lies inside the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|idx| &self.data[idx])
    }

    /// Write a value; out-of-range writes are dropped and reported as `false`.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.data[idx] = value;
                true
            }
            None => false,
        }
    }

    /// Iterate over all cells with their coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, &T)> {
        let width = self.width;
        self.data.iter().enumerate().map(move |(idx, val)| {
            ((idx % width) as i32, (idx / width) as i32, val)
        })
    }

    /// One row of the grid, left to right.
    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_access_is_absent() {
        let mut map = Tilemap::new_with(4, 3, 7u8);
        assert_eq!(map.get(-1, 0), None);
        assert_eq!(map.get(4, 0), None);
        assert_eq!(map.get(0, 3), None);
        assert!(!map.set(10, 10, 1));
        assert!(map.set(3, 2, 1));
        assert_eq!(map.get(3, 2), Some(&1));
    }

    #[test]
    fn test_rows_follow_iteration_order() {
        let mut map = Tilemap::new_with(3, 2, 0);
        for y in 0..2 {
            for x in 0..3 {
                map.set(x, y, y * 10 + x);
            }
        }
        assert_eq!(map.row(1), &[10, 11, 12]);
        let cells: Vec<_> = map.iter().map(|(_, _, &v)| v).collect();
        assert_eq!(cells, vec![0, 1, 2, 10, 11, 12]);
    }
}
