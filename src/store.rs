use crate::auth::Authenticator;
use crate::error::GradeBookError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "gradebook.json";

/// One student as stored in the gradebook file.
///
/// Field names match the on-disk JSON (`ID`, `Name`, `Class`, `Grades`).
/// Attributes outside those four are kept in `extra` and written back as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Class", default)]
    pub class: String,
    #[serde(rename = "Grades", default)]
    pub grades: Vec<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StudentRecord {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            class: class.into(),
            grades: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Builds a record from caller-supplied JSON. `ID` must be a string.
    pub fn from_value(value: serde_json::Value) -> Result<Self, GradeBookError> {
        match value.get("ID") {
            Some(serde_json::Value::String(_)) => {}
            _ => return Err(GradeBookError::MissingId),
        }
        serde_json::from_value(value).map_err(GradeBookError::InvalidRecord)
    }
}

pub type Mapping = BTreeMap<String, StudentRecord>;

/// Student records keyed by ID, mirrored to a JSON file on every mutation.
pub struct GradeBook {
    path: PathBuf,
    students: Mapping,
    authenticator: Option<Box<dyn Authenticator>>,
}

impl GradeBook {
    /// Loads the gradebook at `path`. A missing file yields an empty book.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GradeBookError> {
        let path = path.into();
        let students = load_mapping(&path)?;
        log::debug!(
            "opened gradebook {} ({} students)",
            path.to_string_lossy(),
            students.len()
        );
        Ok(Self {
            path,
            students,
            authenticator: None,
        })
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Some(Box::new(authenticator));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Re-reads the canonical file, replacing everything held in memory.
    pub fn reload(&mut self) -> Result<(), GradeBookError> {
        self.students = load_mapping(&self.path)?;
        Ok(())
    }

    /// Inserts a new student. Any grades on the incoming record are dropped.
    pub fn add_student(&mut self, mut record: StudentRecord) -> Result<(), GradeBookError> {
        if self.students.contains_key(&record.id) {
            return Err(GradeBookError::AlreadyExists(record.id));
        }
        record.grades.clear();
        let id = record.id.clone();
        self.students.insert(id.clone(), record);
        self.persist_or_revert(|students| {
            students.remove(&id);
        })?;
        log::info!("added student {id}");
        Ok(())
    }

    pub fn delete_student(&mut self, id: &str) -> Result<(), GradeBookError> {
        let Some(removed) = self.students.remove(id) else {
            return Err(GradeBookError::NotFound(id.to_string()));
        };
        self.persist_or_revert(move |students| {
            students.insert(removed.id.clone(), removed);
        })?;
        log::info!("deleted student {id}");
        Ok(())
    }

    pub fn add_grade(&mut self, id: &str, grade: f64) -> Result<(), GradeBookError> {
        let Some(student) = self.students.get_mut(id) else {
            return Err(GradeBookError::NotFound(id.to_string()));
        };
        student.grades.push(grade);
        self.persist_or_revert(|students| {
            if let Some(s) = students.get_mut(id) {
                s.grades.pop();
            }
        })?;
        log::info!("added grade {grade} for student {id}");
        Ok(())
    }

    /// Removes the first grade exactly equal to `grade`. No tolerance is
    /// applied, so `3.1` does not match a stored `3.10000000001`.
    pub fn delete_grade(&mut self, id: &str, grade: f64) -> Result<(), GradeBookError> {
        let Some(student) = self.students.get_mut(id) else {
            return Err(GradeBookError::NotFound(id.to_string()));
        };
        let Some(pos) = student.grades.iter().position(|g| *g == grade) else {
            return Err(GradeBookError::GradeNotFound {
                id: id.to_string(),
                grade,
            });
        };
        let removed = student.grades.remove(pos);
        self.persist_or_revert(|students| {
            if let Some(s) = students.get_mut(id) {
                s.grades.insert(pos, removed);
            }
        })?;
        log::info!("deleted grade {grade} for student {id}");
        Ok(())
    }

    /// Mean of the student's grades, `None` while the list is empty.
    pub fn calculate_final_grade(&self, id: &str) -> Result<Option<f64>, GradeBookError> {
        let student = self.student(id)?;
        if student.grades.is_empty() {
            return Ok(None);
        }
        let sum: f64 = student.grades.iter().sum();
        Ok(Some(sum / student.grades.len() as f64))
    }

    pub fn get_grades(&self, id: &str) -> Result<Vec<f64>, GradeBookError> {
        Ok(self.student(id)?.grades.clone())
    }

    pub fn find_student(&self, id: &str) -> Option<StudentRecord> {
        self.students.get(id).cloned()
    }

    /// Snapshot of every record. Changes to the copy are not persisted.
    pub fn list_all(&self) -> Mapping {
        self.students.clone()
    }

    /// Writes the current records to `out_path`. The canonical file is left alone.
    pub fn export(&self, out_path: &Path) -> Result<(), GradeBookError> {
        write_mapping(out_path, &self.students)?;
        log::info!(
            "exported {} students to {}",
            self.students.len(),
            out_path.to_string_lossy()
        );
        Ok(())
    }

    /// Always `false` when no authenticator is attached.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.authenticator
            .as_ref()
            .map(|a| a.authenticate(username, password))
            .unwrap_or(false)
    }

    fn student(&self, id: &str) -> Result<&StudentRecord, GradeBookError> {
        self.students
            .get(id)
            .ok_or_else(|| GradeBookError::NotFound(id.to_string()))
    }

    fn persist(&self) -> Result<(), GradeBookError> {
        write_mapping(&self.path, &self.students)
    }

    // Memory must not drift from disk when a write fails.
    fn persist_or_revert<F>(&mut self, revert: F) -> Result<(), GradeBookError>
    where
        F: FnOnce(&mut Mapping),
    {
        if let Err(e) = self.persist() {
            log::warn!("persist failed, reverting: {e}");
            revert(&mut self.students);
            return Err(e);
        }
        Ok(())
    }
}

fn load_mapping(path: &Path) -> Result<Mapping, GradeBookError> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Mapping::new()),
        Err(e) => {
            return Err(GradeBookError::Storage {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&text).map_err(|e| GradeBookError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serializes with 4-space indentation, the layout the data file has always used.
pub fn to_pretty_json(students: &Mapping) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    students.serialize(&mut ser)?;
    Ok(out)
}

fn write_mapping(path: &Path, students: &Mapping) -> Result<(), GradeBookError> {
    let storage = |source: std::io::Error| GradeBookError::Storage {
        path: path.to_path_buf(),
        source,
    };
    let bytes = to_pretty_json(students).map_err(|e| GradeBookError::Malformed {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(storage)?;
        }
    }

    let mut tmp_name = OsString::from(path.as_os_str());
    tmp_name.push(".saving");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, &bytes).map_err(storage)?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        storage(e)
    })?;
    log::debug!(
        "wrote {} students to {}",
        students.len(),
        path.to_string_lossy()
    );
    Ok(())
}
