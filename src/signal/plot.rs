use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::signal::config::CHANNEL_LABELS;
use crate::signal::error::SignalError;
use crate::signal::synth::PressureTrace;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Upper bound of the pressure axis; the lower bound is pinned at zero.
    pub y_max: f32,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA],
            y_max: 1.2,
        }
    }
}
/// Renders one synthesized gesture trace as a PNG, one line per channel.
pub fn render_gesture_png(
    trace: &PressureTrace,
    title: &str,
    style: PlotStyle,
) -> Result<Vec<u8>, SignalError> {
    if trace.is_empty() {
        return Err(SignalError::Plot("pressure trace has no readings".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(title, ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f32..trace.duration_secs() as f32, 0f32..style.y_max)?;
        chart
            .configure_mesh()
            .x_desc("time (s)")
            .y_desc("pressure (normalized)")
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        for (idx, channel) in trace.channels.columns().into_iter().enumerate() {
            let color = style.palette[idx % style.palette.len()];
            let series = trace
                .timestamps
                .iter()
                .zip(channel.iter())
                .map(|(&t, &v)| (t as f32, v as f32));
            chart
                .draw_series(LineSeries::new(series, &color))?
                .label(
                    CHANNEL_LABELS
                        .get(idx)
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| format!("ch {idx}")),
                )
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        chart
            .configure_series_labels()
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, SignalError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| SignalError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
