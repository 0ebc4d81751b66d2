//! Form control state recovery

use super::context::SerializationContext;
use crate::dom::{ControlType, NodeId};

/// Write the live state of every form control in `scope` onto its clone.
pub(crate) fn serialize_inputs(ctx: &mut SerializationContext<'_>, scope: NodeId) {
    let live = ctx.live;
    for control in live.descendants(scope) {
        let Some(kind) = live.control_type(control) else {
            continue;
        };
        let Some(target) = ctx.clone_of(control) else {
            continue;
        };

        match kind {
            ControlType::Checkbox | ControlType::Radio => {
                if live.checked(control) {
                    ctx.clone.set_attr(target, "checked", "");
                } else {
                    ctx.clone.remove_attr(target, "checked");
                }
            }
            ControlType::SelectOne => {
                if let Some(index) = live.selected_index(control) {
                    mark_selected(ctx, target, &[index]);
                }
            }
            ControlType::SelectMultiple => {
                let indices = live.selected_indices(control);
                mark_selected(ctx, target, &indices);
            }
            ControlType::TextArea => {
                let value = live.value(control);
                ctx.clone.set_text_content(target, &value);
            }
            ControlType::Input(_) => {
                ctx.clone.set_attr(target, "value", live.value(control));
            }
        }
    }
}

/// Mark exactly the options at `indices` as selected, clearing any
/// `selected` copied from markup.
fn mark_selected(ctx: &mut SerializationContext<'_>, select: NodeId, indices: &[usize]) {
    let options = ctx.clone.options(select);
    for &option in &options {
        ctx.clone.remove_attr(option, "selected");
    }
    for &i in indices {
        if let Some(&option) = options.get(i) {
            ctx.clone.set_attr(option, "selected", "true");
        }
    }
}
