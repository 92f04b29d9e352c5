//! Sort and group classified devices
//!
//! Order is `(category rank, subnet string, IP as integer)`, so the result
//! does not depend on the order in which the worker reported devices.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::classifier::{categorize, CategorizedDevice, Category};
use super::types::{DeviceFilter, ScannedDevice};
use super::utils::{ip_in_cidr, ip_to_u32};

/// Classify every device and return them in display order
pub fn sort_and_group(
    devices: Vec<ScannedDevice>,
    registered_ips: &HashSet<String>,
) -> Vec<CategorizedDevice> {
    let mut categorized: Vec<CategorizedDevice> = devices
        .into_iter()
        .map(|d| categorize(d, registered_ips))
        .collect();

    // stable: equal keys keep arrival order
    categorized.sort_by(|a, b| {
        a.category
            .rank()
            .cmp(&b.category.rank())
            .then_with(|| a.device.subnet.cmp(&b.device.subnet))
            .then_with(|| ip_to_u32(&a.device.ip).cmp(&ip_to_u32(&b.device.ip)))
    });

    categorized
}

/// Apply a device filter, then sort and group
pub fn filter_sort_and_group(
    devices: Vec<ScannedDevice>,
    registered_ips: &HashSet<String>,
    filter: &DeviceFilter,
) -> Vec<CategorizedDevice> {
    let devices = devices
        .into_iter()
        .filter(|d| match filter.subnet.as_deref() {
            Some(subnet) => d.subnet == subnet || ip_in_cidr(&d.ip, subnet),
            None => true,
        })
        .collect();

    let mut grouped = sort_and_group(devices, registered_ips);
    if !filter.include_lost {
        grouped.retain(|d| d.category != Category::F);
    }
    grouped
}

/// Count of devices in one category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: Category,
    pub label: String,
    pub count: usize,
}

/// Per-category counts, always listing all six categories in display order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub total: usize,
    pub by_category: Vec<CategoryCount>,
}

impl CategorySummary {
    pub fn from_devices(devices: &[CategorizedDevice]) -> Self {
        let mut counts: BTreeMap<Category, usize> =
            Category::DISPLAY_ORDER.iter().map(|c| (*c, 0)).collect();
        for device in devices {
            *counts.entry(device.category).or_insert(0) += 1;
        }

        Self {
            total: devices.len(),
            by_category: counts
                .into_iter()
                .map(|(category, count)| CategoryCount {
                    category,
                    label: category.label().to_string(),
                    count,
                })
                .collect(),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        self.by_category
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}
