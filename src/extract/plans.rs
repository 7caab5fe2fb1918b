//! The per-category extraction plans. Paths, reveal controls and DOM
//! patterns mirror the wiki's markup, which is inconsistent across
//! categories: some galleries hide behind tab controls, some render a grid
//! of columns, items is a sortable table. Name sources are documented per
//! harvest rule.

use scraper::Html;

use super::{
    ExtractPlan, element_text, first_text, image_ref, image_title, parse_selector, push_candidate,
};
use crate::category::Category;
use crate::record::Record;

pub(crate) fn plan_for(category: Category) -> &'static ExtractPlan {
    match category {
        Category::Ammo => &AMMO,
        Category::Armor => &ARMOR,
        Category::AshesOfWar => &ASHES_OF_WAR,
        Category::Classes => &CLASSES,
        Category::Incantations => &INCANTATIONS,
        Category::Items => &ITEMS,
        Category::Shields => &SHIELDS,
        Category::Sorceries => &SORCERIES,
        Category::Spirits => &SPIRITS,
        Category::Talismans => &TALISMANS,
        Category::WeaponCategories => &WEAPON_CATEGORIES,
    }
}

static AMMO: ExtractPlan = ExtractPlan {
    path: "/Arrows+and+Bolts",
    reveal: Some("//div[contains(@class, 'tabtitle') and contains(., 'Arrow and Bolt Gallery')]"),
    ready: Some("div[class*='tabcontent'][class*='1-tab']"),
    settle: true,
    harvest: harvest_ammo,
};

static ARMOR: ExtractPlan = ExtractPlan {
    path: "/Armor",
    reveal: None,
    ready: Some("#sub-main #wiki-content-block div[class*='col-sm-9']"),
    settle: false,
    harvest: harvest_armor,
};

static ASHES_OF_WAR: ExtractPlan = ExtractPlan {
    path: "/Ashes+of+War",
    reveal: Some("//div[contains(@class, 'tabtitle') and contains(., 'Ashes of War Gallery')]"),
    ready: Some("div[class*='tabcontent'][class*='1-tab']"),
    settle: true,
    harvest: harvest_ashes_of_war,
};

static CLASSES: ExtractPlan = ExtractPlan {
    path: "/Classes",
    reveal: None,
    ready: Some("div.row"),
    settle: true,
    harvest: harvest_classes,
};

static INCANTATIONS: ExtractPlan = ExtractPlan {
    path: "/Incantations",
    reveal: Some("//div[contains(text(), 'Incantations by Type')]"),
    ready: None,
    settle: true,
    harvest: harvest_incantations,
};

static ITEMS: ExtractPlan = ExtractPlan {
    path: "/Items",
    reveal: Some("//div[contains(text(), 'Elden Ring Key Items Table')]"),
    ready: Some("table.wiki_table.sortable.searchable"),
    settle: false,
    harvest: harvest_items,
};

static SHIELDS: ExtractPlan = ExtractPlan {
    path: "/Shields",
    reveal: None,
    ready: None,
    settle: true,
    harvest: harvest_shields,
};

static SORCERIES: ExtractPlan = ExtractPlan {
    path: "/Sorceries",
    reveal: Some("//div[contains(text(), 'Sorceries by Type')]"),
    ready: None,
    settle: true,
    harvest: harvest_sorceries,
};

static SPIRITS: ExtractPlan = ExtractPlan {
    path: "/Spirit+Ashes",
    reveal: Some("//div[contains(text(), 'Spirits Gallery')]"),
    ready: None,
    settle: true,
    harvest: harvest_spirits,
};

static TALISMANS: ExtractPlan = ExtractPlan {
    path: "/Talismans",
    reveal: None,
    ready: None,
    settle: true,
    harvest: harvest_talismans,
};

static WEAPON_CATEGORIES: ExtractPlan = ExtractPlan {
    path: "/Weapons",
    reveal: None,
    ready: None,
    settle: true,
    harvest: harvest_weapon_categories,
};

/// Gallery grid behind the arrows tab; each tile is a wiki link carrying
/// both the name (link text) and the image.
fn harvest_ammo(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(pane_sel), Some(row_sel), Some(link_sel)) = (
        parse_selector("div[class*='tabcontent'][class*='1-tab']"),
        parse_selector("div.row"),
        parse_selector("[class*='wiki_link']"),
    ) else {
        return records;
    };
    for pane in doc.select(&pane_sel) {
        for row in pane.select(&row_sel) {
            for link in row.select(&link_sel) {
                let name = element_text(link);
                let image = image_ref(link, false);
                push_candidate(&mut records, "ammo", &name, &image, base_url);
            }
        }
    }
    records
}

/// Armor sets are laid out directly in the main content column; name from
/// the `h4` heading.
fn harvest_armor(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(root_sel), Some(row_sel), Some(col_sel)) = (
        parse_selector("#sub-main #wiki-content-block div[class*='col-sm-9']"),
        parse_selector("div[class*='row']"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    let Some(root) = doc.select(&root_sel).next() else {
        return records;
    };
    for row in root.select(&row_sel) {
        for col in row.select(&col_sel) {
            let name = first_text(col, "h4");
            let image = image_ref(col, false);
            push_candidate(&mut records, "armor", &name, &image, base_url);
        }
    }
    records
}

/// Same tabbed gallery shape as ammo, but tiles are `col` divs named by an
/// `h4` heading.
fn harvest_ashes_of_war(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(pane_sel), Some(row_sel), Some(col_sel)) = (
        parse_selector("div[class*='tabcontent'][class*='1-tab']"),
        parse_selector("div[class*='row'][class*='gallery']"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    for pane in doc.select(&pane_sel) {
        for row in pane.select(&row_sel) {
            for col in row.select(&col_sel) {
                let name = first_text(col, "h4");
                let image = image_ref(col, false);
                push_candidate(&mut records, "ashes-of-war", &name, &image, base_url);
            }
        }
    }
    records
}

/// Starting classes: fixed four-column rows, name from the `h3` heading.
fn harvest_classes(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(row_sel), Some(col_sel)) = (
        parse_selector("div.row"),
        parse_selector("div.col-sm-3"),
    ) else {
        return records;
    };
    for row in doc.select(&row_sel) {
        for col in row.select(&col_sel) {
            let name = first_text(col, "h3");
            let image = image_ref(col, false);
            push_candidate(&mut records, "classes", &name, &image, base_url);
        }
    }
    records
}

/// Second tab pane of the incantations page; the tile's own text is the
/// name.
fn harvest_incantations(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(pane_sel), Some(row_sel), Some(col_sel)) = (
        parse_selector("div[class*='tabcontent'][class*='2-tab']"),
        parse_selector("div[class*='row']"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    for pane in doc.select(&pane_sel) {
        for row in pane.select(&row_sel) {
            for col in row.select(&col_sel) {
                let name = element_text(col);
                let image = image_ref(col, false);
                push_candidate(&mut records, "incantations", &name, &image, base_url);
            }
        }
    }
    records
}

/// Key items live in a sortable wiki table, one record per row; header and
/// spacer rows carry no `h4`/`img` and fall out in normalization.
fn harvest_items(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(table_sel), Some(row_sel)) = (
        parse_selector("table.wiki_table.sortable.searchable"),
        parse_selector("tr"),
    ) else {
        return records;
    };
    let Some(table) = doc.select(&table_sel).next() else {
        return records;
    };
    for row in table.select(&row_sel) {
        let name = first_text(row, "h4");
        let image = image_ref(row, false);
        push_candidate(&mut records, "items", &name, &image, base_url);
    }
    records
}

/// Shield grid; name from the anchor text, falling back to the image's
/// `title` attribute when the anchor only wraps the image.
fn harvest_shields(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(row_sel), Some(col_sel)) = (
        parse_selector("div.row"),
        parse_selector("div.col-xs-6.col-sm-2"),
    ) else {
        return records;
    };
    for row in doc.select(&row_sel) {
        for col in row.select(&col_sel) {
            let mut name = first_text(col, "a");
            if name.is_empty() {
                name = image_title(col);
            }
            let image = image_ref(col, false);
            push_candidate(&mut records, "shields", &name, &image, base_url);
        }
    }
    records
}

/// Sorcery tiles by type; the tile's own text is the name.
fn harvest_sorceries(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(row_sel), Some(col_sel)) = (
        parse_selector("div.row"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    for row in doc.select(&row_sel) {
        for col in row.select(&col_sel) {
            let name = element_text(col);
            let image = image_ref(col, false);
            push_candidate(&mut records, "sorceries", &name, &image, base_url);
        }
    }
    records
}

/// Spirit ash gallery behind its tab; the tile's own text is the name.
fn harvest_spirits(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(pane_sel), Some(row_sel), Some(col_sel)) = (
        parse_selector("div[class*='tabcontent']"),
        parse_selector("div[class*='row']"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    for pane in doc.select(&pane_sel) {
        for row in pane.select(&row_sel) {
            for col in row.select(&col_sel) {
                let name = element_text(col);
                let image = image_ref(col, false);
                push_candidate(&mut records, "spirits", &name, &image, base_url);
            }
        }
    }
    records
}

/// Talisman gallery panes; name from the tooltip anchor.
fn harvest_talismans(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(pane_sel), Some(row_sel), Some(col_sel)) = (
        parse_selector("div[class*='tabcontent']"),
        parse_selector("div[class*='row']"),
        parse_selector("div[class*='col']"),
    ) else {
        return records;
    };
    for pane in doc.select(&pane_sel) {
        for row in pane.select(&row_sel) {
            for col in row.select(&col_sel) {
                let name = first_text(col, "a.wiki_tooltip");
                let image = image_ref(col, false);
                push_candidate(&mut records, "talismans", &name, &image, base_url);
            }
        }
    }
    records
}

/// Weapon category tiles on the weapons overview; name from the wiki link.
/// These thumbnails are rendered eagerly, so `src` wins over `data-src`.
fn harvest_weapon_categories(doc: &Html, base_url: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let (Some(row_sel), Some(col_sel)) = (
        parse_selector("div.row.gallery"),
        parse_selector("div[class*='col-']"),
    ) else {
        return records;
    };
    for row in doc.select(&row_sel) {
        for col in row.select(&col_sel) {
            let name = first_text(col, "a.wiki_link");
            let image = image_ref(col, true);
            push_candidate(&mut records, "weapon-categories", &name, &image, base_url);
        }
    }
    records
}
