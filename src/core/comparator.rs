use crate::db::VideoStatus;
use std::collections::{HashMap, HashSet};

/// 快照分类结果，三个集合互不相交
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// 远端存在但本地没有记录，待下载
    pub unseen: Vec<String>,
    /// 在线且仍出现在快照中，待刷新指标
    pub still_online: Vec<String>,
    /// 在线但从快照中消失，待标记失效
    pub newly_vanished: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.unseen.is_empty() && self.still_online.is_empty() && self.newly_vanished.is_empty()
    }
}

/// 把远端 id 集合与本地 id -> 状态映射分类为三个互斥集合。
///
/// 只有 `online` 记录参与失效检测：`vanished` / `republished` 是终态，
/// 不会因为在快照中重新出现或继续缺席而被改写，避免重复处理和
/// 已补档记录被意外复活。纯函数，无副作用。
pub fn classify(
    remote_ids: &HashSet<String>,
    known: &HashMap<String, VideoStatus>,
) -> SnapshotDiff {
    let mut diff = SnapshotDiff::default();

    for id in remote_ids {
        if !known.contains_key(id) {
            diff.unseen.push(id.clone());
        }
    }

    for (id, status) in known {
        if *status != VideoStatus::Online {
            continue;
        }
        if remote_ids.contains(id) {
            diff.still_online.push(id.clone());
        } else {
            diff.newly_vanished.push(id.clone());
        }
    }

    // 排序保证后续处理和日志输出的顺序一致
    diff.unseen.sort();
    diff.still_online.sort();
    diff.newly_vanished.sort();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn known(list: &[(&str, VideoStatus)]) -> HashMap<String, VideoStatus> {
        list.iter().map(|(s, st)| (s.to_string(), *st)).collect()
    }

    #[test]
    fn classification_is_idempotent() {
        let remote = ids(&["A", "D"]);
        let local = known(&[
            ("A", VideoStatus::Online),
            ("B", VideoStatus::Online),
            ("C", VideoStatus::Vanished),
        ]);

        let first = classify(&remote, &local);
        let second = classify(&remote, &local);
        assert_eq!(first, second);
    }

    #[test]
    fn known_ids_fall_into_exactly_one_bucket() {
        let remote = ids(&["A", "B", "E", "F"]);
        let local = known(&[
            ("A", VideoStatus::Online),
            ("B", VideoStatus::Vanished),
            ("C", VideoStatus::Online),
            ("D", VideoStatus::Republished),
            ("E", VideoStatus::Republished),
        ]);

        let diff = classify(&remote, &local);

        for id in local.keys() {
            let in_online = diff.still_online.contains(id);
            let in_vanished = diff.newly_vanished.contains(id);
            let ignored = local[id] != VideoStatus::Online;
            // 每个已知 id 恰好落入 still_online / newly_vanished / 忽略 之一
            assert_eq!(
                [in_online, in_vanished, ignored].iter().filter(|b| **b).count(),
                1,
                "id {} 分类不唯一",
                id
            );
        }

        for id in &remote {
            let in_unseen = diff.unseen.contains(id);
            let in_online = diff.still_online.contains(id);
            // 每个远端 id 要么是新视频，要么已在线，要么属于被忽略的终态记录
            assert!(!(in_unseen && in_online), "id {} 同时出现在两个集合", id);
            if !local.contains_key(id) {
                assert!(in_unseen);
            }
        }
    }

    #[test]
    fn terminal_states_are_never_reclassified() {
        let local = known(&[("R", VideoStatus::Republished)]);

        // 重新出现也不复活
        let diff = classify(&ids(&["R"]), &local);
        assert!(diff.is_empty());

        // 继续缺席也不再次标记失效
        let diff = classify(&ids(&[]), &local);
        assert!(diff.is_empty());
    }

    #[test]
    fn vanish_detection_scenario() {
        // 已知 {A: online, B: online, C: vanished}，快照 {A}
        let remote = ids(&["A"]);
        let local = known(&[
            ("A", VideoStatus::Online),
            ("B", VideoStatus::Online),
            ("C", VideoStatus::Vanished),
        ]);

        let diff = classify(&remote, &local);
        assert_eq!(diff.still_online, vec!["A"]);
        assert_eq!(diff.newly_vanished, vec!["B"]);
        assert!(diff.unseen.is_empty());
    }

    #[test]
    fn new_video_scenario() {
        // 快照 {A, B, D}，D 没有本地记录
        let remote = ids(&["A", "B", "D"]);
        let local = known(&[("A", VideoStatus::Online), ("B", VideoStatus::Online)]);

        let diff = classify(&remote, &local);
        assert_eq!(diff.unseen, vec!["D"]);
        assert_eq!(diff.still_online, vec!["A", "B"]);
        assert!(diff.newly_vanished.is_empty());
    }
}
