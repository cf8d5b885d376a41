//! Building blocks for product grid infographics.
//!
//! A [`Compositor`] paints onto a single canvas in call order. The grid,
//! text and image helpers compute where things go; [`template`] puts them
//! together into the header / cards / footer layout.
//!
//! ```no_run
//! use infographic_core::{Color, Compositor, Section};
//!
//! let mut c = Compositor::new();
//! c.create_canvas(1200, 1800, Color::WHITE)?
//!     .create_section(Section::new((0, 0), (1200, 200), Color::parse("efefef")?))?;
//! c.save("out.png")?;
//! # Ok::<(), infographic_core::Error>(())
//! ```

pub mod collab;
pub mod collect;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod font;
pub mod grid;
pub mod imageops;
mod raster;
pub mod template;
pub mod text;

pub use color::Color;
pub use compositor::{Band, CardLayout, Compositor, ProductCard, Section, TextSpec};
pub use config::LayoutConfig;
pub use error::{Error, Result};
pub use font::{Font, FontPolicy, FontSpec};
pub use grid::{Cell, GridSpec, Point};
pub use imageops::{Effect, PrepareSpec};
pub use template::{ProductEntry, compose_product_grid, render_product_grid};
pub use text::{Alignment, TextBlock, TextMetrics};
