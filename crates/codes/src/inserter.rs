use fcstamp_core::{
    Color, FontFormat, HostDocument, HostError, HostErrorKind, InsertLocation, TextStyle,
    Underline,
};
use tracing::info;

use crate::code::Code;
use crate::error::CodeError;
use crate::pending::PendingCode;

/// The formatting every inserted code receives: Arial 8 pt light gray, no emphasis.
pub fn code_style() -> TextStyle {
    TextStyle {
        font_name: "Arial".into(),
        size: 8.0,
        color: Color::LIGHT_GRAY,
        bold: false,
        italic: false,
        underline: Underline::None,
        strike_through: false,
        superscript: false,
        subscript: false,
    }
}

/// Writes the pending code after the current selection and styles it.
///
/// Every attribute of `style` is set explicitly so nothing is inherited from
/// the surrounding text. The selection is left where it was. The slot is only
/// cleared once the host confirmed the batch.
pub async fn insert_pending<H>(
    host: &mut H,
    pending: &mut PendingCode,
    style: &TextStyle,
) -> Result<Code, CodeError>
where
    H: HostDocument + ?Sized,
{
    let code = pending.get().ok_or(CodeError::NoPendingCode)?;
    write_code(host, code, style).await.map_err(classify)?;
    pending.take();
    info!(%code, "inserted code");
    Ok(code)
}

async fn write_code<H>(host: &mut H, code: Code, style: &TextStyle) -> Result<(), HostError>
where
    H: HostDocument + ?Sized,
{
    let selection = host.selection().await?;
    let inserted = host
        .insert_text(selection, &code.to_string(), InsertLocation::End)
        .await?;
    host.set_font(inserted, &FontFormat::complete(style)).await?;
    host.sync().await
}

fn classify(err: HostError) -> CodeError {
    match err.kind() {
        HostErrorKind::InvalidArgument => CodeError::IgnorableInsertion(err),
        _ => CodeError::Host(err),
    }
}
