// Execution plan builder
//
// Runs once per submission, before any download starts, so the "N of M"
// denominator is fixed for the whole run.

use tracing::{debug, info};

use super::classifier::{classify, strip_playlist_context, UrlKind};
use super::models::{ExecutionPlan, StatusEvent, WorkItem};
use super::traits::{PlaylistCount, PlaylistProbe, ProgressEmitter};

pub async fn build_plan(
    urls: &[String],
    expand_playlists: bool,
    probe: &dyn PlaylistProbe,
    emitter: &ProgressEmitter,
) -> ExecutionPlan {
    let mut items = Vec::with_capacity(urls.len());

    for raw in urls {
        let url = raw.trim();
        let item = match (classify(url), expand_playlists) {
            (UrlKind::PlaylistRoot, true) => {
                let count = probe.count_items(url).await;
                match count.positive() {
                    Some(n) => WorkItem::full_playlist(url, n),
                    None => {
                        emitter.status(StatusEvent::warning(match count {
                            PlaylistCount::Known(_) => {
                                "⚠️ Playlist appears empty - trying first video only"
                            }
                            PlaylistCount::Unknown => {
                                "⚠️ Could not read playlist size - trying first video only"
                            }
                        }));
                        WorkItem::single(url)
                    }
                }
            }
            (UrlKind::PlaylistRoot, false) => {
                emitter.status(StatusEvent::warning(
                    "⚠️ Playlist detected - downloading first video only",
                ));
                WorkItem::single(url)
            }
            (UrlKind::ItemInPlaylist { start_index }, true) => {
                let total = probe.count_items(url).await;
                if total == PlaylistCount::Unknown {
                    emitter.status(StatusEvent::warning(
                        "⚠️ Could not read playlist size - progress count may be off",
                    ));
                }
                let remaining = (total.value() + 1).saturating_sub(start_index).max(1);
                emitter.status(StatusEvent::info(format!(
                    "📋 Downloading playlist from video #{}",
                    start_index
                )));
                WorkItem::partial_playlist(url, remaining, start_index)
            }
            (UrlKind::ItemInPlaylist { .. }, false) => WorkItem::single(strip_playlist_context(url)),
            (UrlKind::Single, _) => WorkItem::single(url),
        };

        debug!(url = %item.url, kind = ?item.kind, count = item.item_count, "Planned work item");
        items.push(item);
    }

    let plan = ExecutionPlan::new(items);
    info!(
        work_items = plan.items().len(),
        total = plan.total_item_count(),
        "Execution plan ready"
    );
    plan
}
