pub mod renderer;

pub use renderer::ThemeRenderer;
