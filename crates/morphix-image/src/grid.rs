use crate::error::GridError;

/// Grid size in pixels
///
/// A struct to represent the spatial extent of a grid. Planar images have a
/// depth of one.
///
/// # Examples
///
/// ```
/// use morphix_image::GridSize;
///
/// let size = GridSize {
///   width: 10,
///   height: 20,
///   depth: 1,
/// };
///
/// assert_eq!(size.num_pixels(), 200);
/// assert!(!size.is_3d());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSize {
    /// Width of the grid in pixels
    pub width: usize,
    /// Height of the grid in pixels
    pub height: usize,
    /// Depth of the grid in pixels
    pub depth: usize,
}

impl GridSize {
    /// Number of spatial cells (channels excluded).
    pub fn num_pixels(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Whether the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.num_pixels() == 0
    }

    /// Whether the grid extends along the depth axis.
    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Extent along `axis`, where 0 is x, 1 is y and 2 is z.
    pub fn extent(&self, axis: usize) -> usize {
        match axis {
            0 => self.width,
            1 => self.height,
            _ => self.depth,
        }
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "GridSize {{ width: {}, height: {}, depth: {} }}",
            self.width, self.height, self.depth
        )
    }
}

impl From<[usize; 2]> for GridSize {
    fn from(size: [usize; 2]) -> Self {
        GridSize {
            width: size[0],
            height: size[1],
            depth: 1,
        }
    }
}

impl From<[usize; 3]> for GridSize {
    fn from(size: [usize; 3]) -> Self {
        GridSize {
            width: size[0],
            height: size[1],
            depth: size[2],
        }
    }
}

/// Trait for pixel data types.
///
/// Send and Sync is required for the rayon line passes.
pub trait GridDtype: Copy + Default + PartialOrd + Send + Sync + std::fmt::Debug {
    /// Convert the value to f64.
    fn to_f64(self) -> f64;

    /// Convert a f64 value to the pixel data type, saturating integer types.
    fn from_f64(x: f64) -> Self;
}

impl GridDtype for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(x: f64) -> Self {
        x
    }
}

impl GridDtype for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(x: f64) -> Self {
        x as f32
    }
}

macro_rules! impl_grid_dtype_int {
    ($($t:ty),*) => {
        $(
            impl GridDtype for $t {
                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(x: f64) -> Self {
                    x.round().clamp(<$t>::MIN as f64, <$t>::MAX as f64) as $t
                }
            }
        )*
    };
}

impl_grid_dtype_int!(u8, u16, u32, i16, i32);

/// Represents a dense grid of pixel data.
///
/// The data is stored row-major as (D, H, W, C): the channel index varies
/// fastest, followed by x, y and z.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T, const CHANNELS: usize> {
    size: GridSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Grid<T, CHANNELS> {
    /// Create a new grid from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the grid in pixels.
    /// * `data` - The pixel data of the grid.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the grid size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphix_image::{Grid, GridSize};
    ///
    /// let grid = Grid::<u8, 3>::new(
    ///     GridSize {
    ///         width: 10,
    ///         height: 20,
    ///         depth: 2,
    ///     },
    ///     vec![0u8; 10 * 20 * 2 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(grid.width(), 10);
    /// assert_eq!(grid.depth(), 2);
    /// assert_eq!(grid.num_channels(), 3);
    /// ```
    pub fn new(size: GridSize, data: Vec<T>) -> Result<Self, GridError> {
        let expected = size.num_pixels() * CHANNELS;
        if data.len() != expected {
            return Err(GridError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Create a new grid with the given size filled with `val`.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphix_image::Grid;
    ///
    /// let grid = Grid::<f32, 1>::from_size_val([4, 3].into(), 1.5).unwrap();
    ///
    /// assert_eq!(grid.as_slice().len(), 12);
    /// assert!(grid.as_slice().iter().all(|&v| v == 1.5));
    /// ```
    pub fn from_size_val(size: GridSize, val: T) -> Result<Self, GridError>
    where
        T: Clone,
    {
        let data = vec![val; size.num_pixels() * CHANNELS];
        Grid::new(size, data)
    }

    /// Create a new grid by evaluating `f` at every (x, y, z) in raster order.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphix_image::Grid;
    ///
    /// let ramp = Grid::<u32, 1>::from_fn([3, 2].into(), |x, y, _| [(y * 3 + x) as u32]);
    ///
    /// assert_eq!(ramp.as_slice(), &[0, 1, 2, 3, 4, 5]);
    /// ```
    pub fn from_fn(
        size: GridSize,
        mut f: impl FnMut(usize, usize, usize) -> [T; CHANNELS],
    ) -> Self {
        let mut data = Vec::with_capacity(size.num_pixels() * CHANNELS);
        for z in 0..size.depth {
            for y in 0..size.height {
                for x in 0..size.width {
                    data.extend(f(x, y, z));
                }
            }
        }
        Self { size, data }
    }

    /// Get the size of the grid in pixels.
    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Get the width of the grid in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the grid in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the depth of the grid in pixels.
    pub fn depth(&self) -> usize {
        self.size.depth
    }

    /// Get the number of channels in the grid.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Number of spatial cells.
    pub fn num_pixels(&self) -> usize {
        self.size.num_pixels()
    }

    /// Whether the grid holds no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the grid extends along the depth axis.
    pub fn is_3d(&self) -> bool {
        self.size.is_3d()
    }

    /// Get the pixel data as a flat slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Get the pixel data as a flat mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the grid and return its pixel data.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Linear pixel index of the cell at (x, y, z).
    #[inline]
    pub fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.size.height + y) * self.size.width + x
    }

    /// Spatial coordinates (x, y, z) of a linear pixel index.
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize, usize) {
        let plane = self.size.width * self.size.height;
        let z = index / plane;
        let rem = index % plane;
        (rem % self.size.width, rem / self.size.width, z)
    }

    /// Get a reference to the value at `[z, y, x, c]`.
    pub fn get(&self, index: [usize; 4]) -> Option<&T> {
        let [z, y, x, c] = index;
        if x >= self.width() || y >= self.height() || z >= self.depth() || c >= CHANNELS {
            return None;
        }
        self.data.get(self.offset(x, y, z) * CHANNELS + c)
    }

    /// Get a mutable reference to the value at `[z, y, x, c]`.
    pub fn get_mut(&mut self, index: [usize; 4]) -> Option<&mut T> {
        let [z, y, x, c] = index;
        if x >= self.width() || y >= self.height() || z >= self.depth() || c >= CHANNELS {
            return None;
        }
        let idx = self.offset(x, y, z) * CHANNELS + c;
        self.data.get_mut(idx)
    }

    /// All channel values of the pixel with linear index `index`.
    #[inline]
    pub fn pixel(&self, index: usize) -> &[T] {
        &self.data[index * CHANNELS..(index + 1) * CHANNELS]
    }

    /// Apply `f` to every value, producing a grid of the same shape.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Grid<U, CHANNELS> {
        Grid {
            size: self.size,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Cast the pixel data of the grid to a different type.
    ///
    /// # Errors
    ///
    /// If a value cannot be represented in the target type, an error is returned.
    pub fn cast<U>(&self) -> Result<Grid<U, CHANNELS>, GridError>
    where
        U: num_traits::NumCast,
        T: num_traits::NumCast + Copy,
    {
        let data = self
            .data
            .iter()
            .map(|&x| U::from(x).ok_or(GridError::CastError))
            .collect::<Result<Vec<U>, GridError>>()?;

        Grid::new(self.size, data)
    }

    /// Get a channel of the grid.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn channel(&self, channel: usize) -> Result<Grid<T, 1>, GridError>
    where
        T: Copy,
    {
        if channel >= CHANNELS {
            return Err(GridError::ChannelIndexOutOfBounds(channel, CHANNELS));
        }

        let data = self
            .data
            .iter()
            .skip(channel)
            .step_by(CHANNELS)
            .copied()
            .collect();

        Grid::new(self.size, data)
    }

    /// Split the grid into its channels.
    ///
    /// # Examples
    ///
    /// ```
    /// use morphix_image::Grid;
    ///
    /// let grid = Grid::<f32, 2>::from_size_val([10, 20].into(), 0.0).unwrap();
    ///
    /// let channels = grid.split_channels().unwrap();
    /// assert_eq!(channels.len(), 2);
    /// ```
    pub fn split_channels(&self) -> Result<Vec<Grid<T, 1>>, GridError>
    where
        T: Copy,
    {
        (0..CHANNELS).map(|c| self.channel(c)).collect()
    }
}
