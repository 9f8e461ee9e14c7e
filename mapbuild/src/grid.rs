/// Fixed-size `width` x `height` matrix of optional cells, row-major.
///
/// Out-of-range coordinates are a programming error and panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellGrid<T> {
    width: u32,
    height: u32,
    cells: Vec<Option<T>>,
}

impl<T> CellGrid<T> {
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        cells.resize_with(width as usize * height as usize, || None);
        CellGrid {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        self.cells[self.index(x, y)].as_ref()
    }

    pub fn set(&mut self, x: u32, y: u32, value: Option<T>) {
        let index = self.index(x, y);
        self.cells[index] = value;
    }

    /// Row-major `(x, y, cell)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Option<&T>)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i as u32 % width, i as u32 / width, cell.as_ref()))
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({}, {}) outside {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let grid: CellGrid<u8> = CellGrid::new(3, 2);
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert_eq!(grid.occupied(), 0);
        assert!(grid.iter().all(|(_, _, cell)| cell.is_none()));
    }

    #[test]
    fn test_set_get() {
        let mut grid = CellGrid::new(3, 2);
        grid.set(2, 1, Some(7u8));
        grid.set(0, 0, Some(1));
        assert_eq!(grid.get(2, 1), Some(&7));
        assert_eq!(grid.get(0, 0), Some(&1));
        assert_eq!(grid.get(1, 0), None);

        grid.set(2, 1, Some(9));
        assert_eq!(grid.get(2, 1), Some(&9));
        grid.set(2, 1, None);
        assert_eq!(grid.get(2, 1), None);
    }

    #[test]
    fn test_iter_row_major() {
        let mut grid = CellGrid::new(2, 2);
        grid.set(1, 0, Some('b'));
        grid.set(0, 1, Some('c'));
        let cells: Vec<(u32, u32, Option<&char>)> = grid.iter().collect();
        assert_eq!(
            cells,
            [(0, 0, None), (1, 0, Some(&'b')), (0, 1, Some(&'c')), (1, 1, None)]
        );
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        let grid: CellGrid<u8> = CellGrid::new(2, 2);
        grid.get(2, 0);
    }

    #[test]
    #[should_panic]
    fn test_set_out_of_range_panics() {
        let mut grid = CellGrid::new(2, 2);
        grid.set(0, 2, Some(1u8));
    }
}
