//! The four-dimensional periodic lattice.

use gluon_core::{Parity, ND};

use crate::error::LayoutError;
use crate::subset::Subset;

/// A periodic `Lx × Ly × Lz × Lt` lattice.
///
/// All neighbour lookups are table driven. Every extent must be even, so
/// both neighbours of a site along any direction lie on the opposite
/// checkerboard, also across the periodic seam.
///
/// # Examples
///
/// ```
/// use gluon_core::Parity;
/// use gluon_layout::Layout;
///
/// let l = Layout::new([4, 4, 4, 8]).unwrap();
/// assert_eq!(l.volume(), 512);
/// assert_eq!(l.sites(Parity::Odd).len(), 256);
///
/// let s = l.site([3, 0, 0, 0]);
/// assert_eq!(l.forward(s, 0), l.site([0, 0, 0, 0]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    dims: [usize; ND],
    volume: usize,
    fwd: [Vec<usize>; ND],
    bwd: [Vec<usize>; ND],
    parity: Vec<Parity>,
    cb_sites: [Vec<usize>; 2],
    cb_index: Vec<usize>,
    all_sites: Vec<usize>,
    seam: [Vec<usize>; ND],
}

impl Layout {
    /// Build the layout and its neighbour tables.
    pub fn new(dims: [usize; ND]) -> Result<Self, LayoutError> {
        for (axis, &extent) in dims.iter().enumerate() {
            if extent == 0 {
                return Err(LayoutError::EmptyDimension { axis });
            }
            if extent % 2 != 0 {
                return Err(LayoutError::OddExtent { axis, extent });
            }
        }
        let volume: usize = dims.iter().product();

        let mut fwd: [Vec<usize>; ND] = std::array::from_fn(|_| vec![0; volume]);
        let mut bwd: [Vec<usize>; ND] = std::array::from_fn(|_| vec![0; volume]);
        let mut parity = Vec::with_capacity(volume);
        let mut cb_sites = [Vec::with_capacity(volume / 2), Vec::with_capacity(volume / 2)];
        let mut cb_index = vec![0; volume];
        let mut seam: [Vec<usize>; ND] = std::array::from_fn(|_| Vec::new());

        for site in 0..volume {
            let c = coords_of(&dims, site);
            for mu in 0..ND {
                let mut up = c;
                up[mu] = (c[mu] + 1) % dims[mu];
                fwd[mu][site] = site_of(&dims, up);
                let mut down = c;
                down[mu] = (c[mu] + dims[mu] - 1) % dims[mu];
                bwd[mu][site] = site_of(&dims, down);
                if c[mu] + 1 == dims[mu] {
                    seam[mu].push(site);
                }
            }
            let p = Parity::of_sum(c.iter().sum());
            let half = &mut cb_sites[p.index()];
            cb_index[site] = half.len();
            half.push(site);
            parity.push(p);
        }

        Ok(Self {
            dims,
            volume,
            fwd,
            bwd,
            parity,
            cb_sites,
            cb_index,
            all_sites: (0..volume).collect(),
            seam,
        })
    }

    /// Lattice extents `[Lx, Ly, Lz, Lt]`.
    pub fn dims(&self) -> [usize; ND] {
        self.dims
    }

    /// Extent along `mu`.
    pub fn extent(&self, mu: usize) -> usize {
        self.dims[mu]
    }

    /// Number of sites.
    pub fn volume(&self) -> usize {
        self.volume
    }

    /// Site index of `coords`, taken modulo the extents.
    pub fn site(&self, coords: [usize; ND]) -> usize {
        let mut wrapped = coords;
        for (c, d) in wrapped.iter_mut().zip(self.dims.iter()) {
            *c %= d;
        }
        site_of(&self.dims, wrapped)
    }

    /// Coordinates of `site`.
    pub fn coords(&self, site: usize) -> [usize; ND] {
        coords_of(&self.dims, site)
    }

    /// `x + μ̂`.
    #[inline]
    pub fn forward(&self, site: usize, mu: usize) -> usize {
        self.fwd[mu][site]
    }

    /// `x − μ̂`.
    #[inline]
    pub fn backward(&self, site: usize, mu: usize) -> usize {
        self.bwd[mu][site]
    }

    /// One step along `mu`, forward or backward.
    #[inline]
    pub fn neighbour(&self, site: usize, mu: usize, forward: bool) -> usize {
        if forward {
            self.forward(site, mu)
        } else {
            self.backward(site, mu)
        }
    }

    /// Whether the link `U_μ(x)` crosses the periodic seam in `mu`.
    pub fn is_boundary_link(&self, site: usize, mu: usize) -> bool {
        self.coords(site)[mu] + 1 == self.dims[mu]
    }

    /// Sites whose `mu` link crosses the periodic seam, in ascending order.
    pub fn boundary_sites(&self, mu: usize) -> &[usize] {
        &self.seam[mu]
    }

    /// Checkerboard of `site`.
    #[inline]
    pub fn parity(&self, site: usize) -> Parity {
        self.parity[site]
    }

    /// Sites of one checkerboard in ascending order.
    pub fn sites(&self, parity: Parity) -> &[usize] {
        &self.cb_sites[parity.index()]
    }

    /// Every site, in ascending order.
    pub fn all_sites(&self) -> &[usize] {
        &self.all_sites
    }

    /// Sites of `subset`, in ascending order.
    pub fn subset_sites(&self, subset: Subset) -> &[usize] {
        match subset.parity() {
            Some(p) => self.sites(p),
            None => self.all_sites(),
        }
    }

    /// Position of `site` within its checkerboard's site list.
    pub fn cb_index(&self, site: usize) -> usize {
        self.cb_index[site]
    }

    /// Sites per checkerboard.
    pub fn half_volume(&self) -> usize {
        self.volume / 2
    }
}

fn site_of(dims: &[usize; ND], c: [usize; ND]) -> usize {
    c[0] + dims[0] * (c[1] + dims[1] * (c[2] + dims[2] * c[3]))
}

fn coords_of(dims: &[usize; ND], mut site: usize) -> [usize; ND] {
    let mut c = [0; ND];
    for (ci, &d) in c.iter_mut().zip(dims.iter()) {
        *ci = site % d;
        site /= d;
    }
    c
}
